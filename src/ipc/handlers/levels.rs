use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{required_f64, required_str};
use crate::ipc::types::{AppState, Request};
use crate::level::{level_to_number, number_to_level, ScoreLevel};
use serde_json::json;

fn levels_from_number(req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let value = required_f64(req, "value")?;
    let level = number_to_level(value);
    Ok(json!({
        "level": level,
        "number": level_to_number(level),
        "label": level.label()
    }))
}

fn levels_to_number(req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let raw = required_str(req, "level")?;
    let level = ScoreLevel::parse(&raw)
        .ok_or_else(|| HandlerErr::bad_params(format!("unknown level: {}", raw)))?;
    Ok(json!({ "level": level, "number": level_to_number(level) }))
}

fn levels_scale() -> serde_json::Value {
    let levels = ScoreLevel::ALL
        .iter()
        .map(|l| {
            json!({
                "level": l,
                "number": level_to_number(*l),
                "label": l.label()
            })
        })
        .collect::<Vec<_>>();
    json!({ "levels": levels })
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "levels.fromNumber" => Some(respond(&req.id, levels_from_number(req))),
        "levels.toNumber" => Some(respond(&req.id, levels_to_number(req))),
        "levels.scale" => Some(respond(&req.id, Ok(levels_scale()))),
        _ => None,
    }
}
