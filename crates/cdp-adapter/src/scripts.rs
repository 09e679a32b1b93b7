//! JavaScript snippets evaluated in the page to resolve element queries.
//!
//! Each query is a single self-contained expression returning a
//! [`QueryProbe`](crate::commands::QueryProbe) shaped object. Side effects
//! (blur, clear, scroll into view) only run once the probe is ready.

use serde_json::json;

use crate::commands::{QueryAction, QuerySpec};

const QUERY_TEMPLATE: &str = r#"(() => {
  const cfg = __CONFIG__;
  const fromXPath = (expr) => {
    const out = [];
    const snap = document.evaluate(expr, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    for (let i = 0; i < snap.snapshotLength; i++) out.push(snap.snapshotItem(i));
    return out;
  };
  const find = () => {
    switch (cfg.by) {
      case "id": {
        const el = document.getElementById(cfg.target);
        return el ? [el] : [];
      }
      case "query": {
        const el = document.querySelector(cfg.target);
        return el ? [el] : [];
      }
      case "query_all":
        return Array.from(document.querySelectorAll(cfg.target));
      case "js_path": {
        const el = (0, eval)(cfg.target);
        return el ? [el] : [];
      }
      default: {
        let found = [];
        try { found = Array.from(document.querySelectorAll(cfg.target)); } catch (_) {}
        if (found.length === 0) {
          try { found = fromXPath(cfg.target); } catch (_) {}
        }
        if (found.length === 0) {
          const el = document.getElementById(cfg.target);
          if (el) found = [el];
        }
        return found;
      }
    }
  };
  let nodes = [];
  try { nodes = find().filter((n) => n && n.nodeType === 1); } catch (_) { nodes = []; }
  if (cfg.on === "not_present") {
    return { ready: nodes.length === 0, count: nodes.length };
  }
  if (nodes.length < cfg.atLeast) {
    return { ready: false, count: nodes.length };
  }
  const visible = (el) => {
    const style = window.getComputedStyle(el);
    const box = el.getBoundingClientRect();
    return style.visibility !== "hidden" && style.display !== "none" && box.width > 0 && box.height > 0;
  };
  const satisfied = (el) => {
    switch (cfg.on) {
      case "visible": return visible(el);
      case "not_visible": return !visible(el);
      case "enabled": return !el.disabled;
      case "selected": return !!(el.selected || el.checked);
      default: return document.readyState !== "loading";
    }
  };
  if (!nodes.every(satisfied)) {
    return { ready: false, count: nodes.length };
  }
  if (cfg.action === "blur") {
    nodes.forEach((el) => el.blur && el.blur());
  }
  if (cfg.action === "clear") {
    nodes.forEach((el) => {
      if ("value" in el) el.value = "";
      else el.textContent = "";
      el.dispatchEvent(new Event("input", { bubbles: true }));
      el.dispatchEvent(new Event("change", { bubbles: true }));
    });
  }
  let rect = null;
  if (cfg.geometry) {
    const el = nodes[0];
    el.scrollIntoView({ block: "center", inline: "center" });
    const box = el.getBoundingClientRect();
    rect = {
      x: box.left,
      y: box.top,
      page_x: box.left + window.scrollX,
      page_y: box.top + window.scrollY,
      width: box.width,
      height: box.height,
    };
  }
  return { ready: true, count: nodes.length, rect };
})()"#;

/// Build the probe expression for `spec` under `action`.
pub fn query_script(spec: &QuerySpec, action: QueryAction) -> String {
    let config = json!({
        "target": spec.target,
        "by": spec.by.as_str(),
        "on": spec.effective_condition(action).as_str(),
        "atLeast": spec.min_matches(),
        "action": action.as_str(),
        "geometry": action.needs_geometry(),
    });
    QUERY_TEMPLATE.replace("__CONFIG__", &config.to_string())
}
