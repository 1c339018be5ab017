//! Flex-message builders for customer notifications.
//!
//! Bubble layouts follow the notification templates the clinics already
//! send: dark header, gold accent, body rows for date/time, and a reason
//! row on rejections.

use serde_json::json;

use crate::LineMessage;

const HEADER_BG: &str = "#0A1929";
const ACCENT: &str = "#FFD700";

fn detail_row(label: &str, value: &str) -> serde_json::Value {
    json!({
        "type": "box",
        "layout": "baseline",
        "margin": "md",
        "contents": [
            { "type": "text", "text": label, "size": "sm", "color": "#999999", "flex": 2 },
            { "type": "text", "text": value, "size": "sm", "wrap": true, "flex": 5 },
        ],
    })
}

fn bubble(title: &str, alt_text: &str, body_rows: Vec<serde_json::Value>) -> LineMessage {
    LineMessage::Flex {
        alt_text: alt_text.to_string(),
        contents: json!({
            "type": "bubble",
            "header": {
                "type": "box",
                "layout": "vertical",
                "backgroundColor": HEADER_BG,
                "contents": [
                    { "type": "text", "text": title, "weight": "bold", "size": "xl", "color": ACCENT },
                ],
            },
            "body": {
                "type": "box",
                "layout": "vertical",
                "contents": body_rows,
            },
        }),
    }
}

/// Confirmation pushed right after a booking is received.
pub fn booking_confirmation(customer_name: &str, date: &str, time: &str) -> LineMessage {
    bubble(
        "✅ 預約確認",
        "預約確認通知",
        vec![
            json!({ "type": "text", "text": format!("{customer_name} 您好"), "size": "md" }),
            json!({ "type": "text", "text": "您的預約已成功建立，待審核後生效。", "size": "sm", "color": "#999999", "margin": "md" }),
            json!({ "type": "separator", "margin": "xl" }),
            detail_row("日期", date),
            detail_row("時間", time),
        ],
    )
}

/// Review decision on an appointment.
pub fn approval_decision(approved: bool, date: &str, time: &str, reason: Option<&str>) -> LineMessage {
    let (title, alt, note) = if approved {
        ("✅ 預約成立", "預約審核結果", "您的預約已通過審核，期待您的光臨。")
    } else {
        ("❌ 預約未通過", "預約審核結果", "很抱歉，您的預約未通過審核。")
    };

    let mut rows = vec![
        json!({ "type": "text", "text": note, "size": "sm", "wrap": true }),
        json!({ "type": "separator", "margin": "xl" }),
        detail_row("日期", date),
        detail_row("時間", time),
    ];
    if let Some(reason) = reason {
        rows.push(detail_row("原因", reason));
    }

    bubble(title, alt, rows)
}

/// Review decision on a reschedule request.
pub fn reschedule_decision(
    approved: bool,
    new_date: &str,
    new_time: &str,
    reason: Option<&str>,
) -> LineMessage {
    let (title, alt, note) = if approved {
        ("🔁 改期成功", "改期審核結果", "您的改期申請已通過，預約時間已更新。")
    } else {
        ("❌ 改期未通過", "改期審核結果", "很抱歉，您的改期申請未通過，原預約時間不變。")
    };

    let mut rows = vec![
        json!({ "type": "text", "text": note, "size": "sm", "wrap": true }),
        json!({ "type": "separator", "margin": "xl" }),
        detail_row("新日期", new_date),
        detail_row("新時間", new_time),
    ];
    if let Some(reason) = reason {
        rows.push(detail_row("原因", reason));
    }

    bubble(title, alt, rows)
}
