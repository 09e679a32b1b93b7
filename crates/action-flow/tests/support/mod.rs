//! Recording backend used by the engine tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use action_flow::SessionAllocator;
use async_trait::async_trait;
use cdp_adapter::{
    AdapterError, AdapterErrorKind, BrowserVersion, DeviceProfile, QueryAction, QuerySpec, Session,
};
use serde_json::Value;

/// One backend call as observed by the mock.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Navigate(String),
    Forward,
    Back,
    Reload,
    Stop,
    Evaluate(String),
    Title,
    Query(QueryAction, String),
    CaptureScreenshot,
    ElementScreenshot { target: String, scale: Option<f64> },
    Emulate(String),
    Version,
    Close,
}

type FailWhen = Arc<dyn Fn(&Call) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct MockSession {
    calls: Arc<Mutex<Vec<Call>>>,
    eval_results: Arc<HashMap<String, Value>>,
    title: String,
    fail_when: Option<FailWhen>,
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            eval_results: Arc::new(HashMap::new()),
            title: "Example Domain".to_string(),
            fail_when: None,
        }
    }

    pub fn with_eval(mut self, script: &str, value: Value) -> Self {
        let mut results = (*self.eval_results).clone();
        results.insert(script.to_string(), value);
        self.eval_results = Arc::new(results);
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn failing_when(mut self, predicate: impl Fn(&Call) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Some(Arc::new(predicate));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls excluding the final session close.
    pub fn actions(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| *call != Call::Close)
            .collect()
    }

    fn record(&self, call: Call) -> Result<(), AdapterError> {
        let fails = self.fail_when.as_ref().map(|f| f(&call)).unwrap_or(false);
        self.calls.lock().unwrap().push(call.clone());
        if fails {
            Err(AdapterError::new(AdapterErrorKind::TargetNotFound)
                .with_hint(format!("mock failure for {call:?}")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Session for MockSession {
    async fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        self.record(Call::Navigate(url.to_string()))
    }

    async fn navigate_forward(&self) -> Result<(), AdapterError> {
        self.record(Call::Forward)
    }

    async fn navigate_back(&self) -> Result<(), AdapterError> {
        self.record(Call::Back)
    }

    async fn reload(&self) -> Result<(), AdapterError> {
        self.record(Call::Reload)
    }

    async fn stop(&self) -> Result<(), AdapterError> {
        self.record(Call::Stop)
    }

    async fn evaluate(&self, script: &str) -> Result<Value, AdapterError> {
        self.record(Call::Evaluate(script.to_string()))?;
        Ok(self.eval_results.get(script).cloned().unwrap_or(Value::Null))
    }

    async fn title(&self) -> Result<String, AdapterError> {
        self.record(Call::Title)?;
        Ok(self.title.clone())
    }

    async fn query_action(
        &self,
        action: QueryAction,
        query: &QuerySpec,
    ) -> Result<(), AdapterError> {
        self.record(Call::Query(action, query.target.clone()))
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>, AdapterError> {
        self.record(Call::CaptureScreenshot)?;
        Ok(b"viewport-png".to_vec())
    }

    async fn element_screenshot(
        &self,
        query: &QuerySpec,
        scale: Option<f64>,
    ) -> Result<Vec<u8>, AdapterError> {
        self.record(Call::ElementScreenshot {
            target: query.target.clone(),
            scale,
        })?;
        Ok(b"element-png".to_vec())
    }

    async fn emulate(&self, device: &DeviceProfile) -> Result<(), AdapterError> {
        self.record(Call::Emulate(device.id()))
    }

    async fn version(&self) -> Result<BrowserVersion, AdapterError> {
        self.record(Call::Version)?;
        Ok(BrowserVersion {
            product: "HeadlessChrome/120.0.0.0".into(),
            protocol_version: "1.3".into(),
            revision: "@abc".into(),
            user_agent: "Mozilla/5.0".into(),
            js_version: "12.0".into(),
        })
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.record(Call::Close)
    }
}

/// Hands out clones of one recording session.
pub struct MockAllocator {
    pub session: MockSession,
    pub device_id: Option<String>,
    pub fail_open: bool,
}

impl MockAllocator {
    pub fn new(session: MockSession) -> Self {
        Self {
            session,
            device_id: None,
            fail_open: false,
        }
    }

    pub fn with_device(mut self, id: &str) -> Self {
        self.device_id = Some(id.to_string());
        self
    }
}

#[async_trait]
impl SessionAllocator for MockAllocator {
    async fn new_session(&self) -> Result<Box<dyn Session>, AdapterError> {
        if self.fail_open {
            return Err(AdapterError::new(AdapterErrorKind::LaunchFailed).with_hint("no browser"));
        }
        Ok(Box::new(self.session.clone()))
    }

    fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }
}
