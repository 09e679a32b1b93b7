//! Ordered selector resolution with shared retry options

use cdp_adapter::QuerySpec;
use soulscript_core_types::{ElementTask, Options, Screenshot, Selector, SelectorBy};
use tracing::trace;

/// Resolve selector inputs into concrete queries.
///
/// Structured selectors keep their declared order; a non-empty `plain`
/// selector is appended last with the search strategy. `options` is copied
/// onto every query. An empty result is valid.
pub fn resolve_selectors(
    plain: &str,
    structured: &[Selector],
    options: Option<&Options>,
) -> Vec<QuerySpec> {
    let plain = (!plain.is_empty()).then(|| Selector::new(plain).with_by(SelectorBy::Search));

    let queries: Vec<QuerySpec> = structured
        .iter()
        .chain(plain.as_ref())
        .map(|selector| to_query(selector, options))
        .collect();

    trace!(count = queries.len(), "resolved selectors");
    queries
}

/// Queries for an element-targeting task.
pub fn resolve_element_task(task: &ElementTask) -> Vec<QuerySpec> {
    resolve_selectors(&task.selector, &task.selectors, task.options.as_ref())
}

/// Queries for a screenshot; empty means a whole-viewport capture.
pub fn resolve_screenshot(task: &Screenshot) -> Vec<QuerySpec> {
    resolve_selectors(&task.selector, &task.selectors, task.options.as_ref())
}

/// Human readable summary used in trace lines.
pub fn describe(queries: &[QuerySpec]) -> String {
    queries
        .iter()
        .map(QuerySpec::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn to_query(selector: &Selector, options: Option<&Options>) -> QuerySpec {
    QuerySpec {
        target: selector.target.clone(),
        by: selector.by,
        on: selector.on,
        retry_interval: options.and_then(|opts| opts.retry_interval),
        at_least: options.and_then(|opts| opts.at_least),
    }
}
