use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::stats;
use serde_json::json;

fn parse_values(req: &Request) -> Result<Vec<f64>, HandlerErr> {
    let Some(arr) = req.params.get("values").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params("values must be an array of numbers"));
    };
    arr.iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64()
                .ok_or_else(|| HandlerErr::bad_params(format!("values[{}] must be a number", i)))
        })
        .collect()
}

fn stats_summary(req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let values = parse_values(req)?;
    let q = match req.params.get("q") {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) => Some(
            v.as_f64()
                .ok_or_else(|| HandlerErr::bad_params("q must be a number in 0..=1"))?,
        ),
    };

    let mut out = json!(stats::summarize(&values));
    if let Some(q) = q {
        out["q"] = json!(q);
        out["quantile"] = json!(stats::quantile(&values, q));
    }
    Ok(out)
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.summary" => Some(respond(&req.id, stats_summary(req))),
        _ => None,
    }
}
