use crate::grades::{classify_grade, grade_scale, validate_grade};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::required_f64;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn grades_validate(req: &Request) -> Result<serde_json::Value, HandlerErr> {
    // A missing or null input is the same as a blank field.
    let input = match req.params.get("input") {
        None => "",
        Some(v) if v.is_null() => "",
        Some(v) => v
            .as_str()
            .ok_or_else(|| HandlerErr::bad_params("input must be string"))?,
    };
    Ok(json!(validate_grade(input)))
}

fn grades_classify(req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let grade = required_f64(req, "grade")?;
    let class = classify_grade(grade);
    Ok(json!({
        "grade": grade,
        "class": class,
        "label": class.label(),
        "color": class.color()
    }))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.validate" => Some(respond(&req.id, grades_validate(req))),
        "grades.classify" => Some(respond(&req.id, grades_classify(req))),
        "grades.scale" => Some(respond(&req.id, Ok(json!({ "grades": grade_scale() })))),
        _ => None,
    }
}
