//! Strategy resolution and lenient field lookup over untyped JSON.
//!
//! Every lookup here is total: a missing key, a wrong type or an unparsable
//! string resolves to `None` (or to `0.0` for [`coerce_numeric`]) instead of
//! an error, so callers can chain candidates freely.

use serde_json::Value;

/// Sub-keys tried, in order, when a numeric field turns out to be an object
/// (e.g. `"gold": {"total": 1200, "current": 300}`).
pub const NUMERIC_SUBKEYS: &[&str] = &["total", "amount", "value", "current"];

/// A named, pure extraction step `raw -> Option<T>`.
pub struct Strategy<'a, T> {
    pub name: &'static str,
    pub run: fn(&'a Value) -> Option<T>,
}

/// Run `strategies` in priority order and return the first hit together with
/// the name of the strategy that produced it.
pub fn resolve_first<'a, T>(
    raw: &'a Value,
    strategies: &[Strategy<'a, T>],
) -> Option<(&'static str, T)> {
    strategies
        .iter()
        .find_map(|s| (s.run)(raw).map(|out| (s.name, out)))
}

/// Interpret `value` as a finite number.
///
/// Fallback order:
/// 1. JSON number
/// 2. numeric string (`"1200"`, `" 3.5 "`)
/// 3. object: the first of `subkeys` holding a scalar number, else the first
///    scalar number among its values (key order is deterministic)
/// 4. anything else: `None`
pub fn numeric(value: &Value, subkeys: &[&str]) -> Option<f64> {
    match value {
        Value::Object(map) => subkeys
            .iter()
            .find_map(|k| map.get(*k).and_then(scalar_numeric))
            .or_else(|| map.values().find_map(scalar_numeric)),
        other => scalar_numeric(other),
    }
}

/// [`numeric`] with the documented default of `0.0`.
pub fn coerce_numeric(value: &Value, subkeys: &[&str]) -> f64 {
    numeric(value, subkeys).unwrap_or(0.0)
}

fn scalar_numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// First numeric value among `candidates`, then among the same candidates
/// one level down inside a `stats` object.
pub fn field_numeric(obj: &Value, candidates: &[&str]) -> Option<f64> {
    let direct = |o: &Value| {
        candidates
            .iter()
            .find_map(|k| o.get(*k).and_then(|v| numeric(v, NUMERIC_SUBKEYS)))
    };
    direct(obj).or_else(|| obj.get("stats").and_then(direct))
}

/// Stringify an identifier: non-empty strings, integral numbers, or an
/// object's own `id` / `participantId` / `playerId`.
pub fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                (f.is_finite() && f.fract() == 0.0).then(|| format!("{}", f as i64))
            }
        }
        Value::Object(_) => field_identifier(value, &["id", "participantId", "playerId"]),
        _ => None,
    }
}

pub fn field_identifier(obj: &Value, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|k| obj.get(*k).and_then(identifier))
}

/// First non-empty string among `candidates`.
pub fn field_str<'a>(obj: &'a Value, candidates: &[&str]) -> Option<&'a str> {
    candidates.iter().find_map(|k| {
        obj.get(*k)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    })
}

/// First non-empty array among `candidates`.
pub fn field_array<'a>(obj: &'a Value, candidates: &[&str]) -> Option<&'a Vec<Value>> {
    candidates.iter().find_map(|k| {
        obj.get(*k)
            .and_then(Value::as_array)
            .filter(|a| !a.is_empty())
    })
}

/// Non-negative millisecond timestamp; negatives clamp to zero.
pub fn as_timestamp(value: &Value) -> Option<u64> {
    numeric(value, &[]).map(|ms| ms.max(0.0).round() as u64)
}

/// Sort key that orders numeric ids numerically and puts the rest after them.
pub fn id_sort_key(id: &str) -> (u8, i64, String) {
    match id.parse::<i64>() {
        Ok(n) => (0, n, String::new()),
        Err(_) => (1, 0, id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_numeric_number_and_string() {
        assert_eq!(numeric(&json!(1200), &[]), Some(1200.0));
        assert_eq!(numeric(&json!(" 3.5 "), &[]), Some(3.5));
        assert_eq!(numeric(&json!("abc"), &[]), None);
        assert_eq!(numeric(&json!(null), &[]), None);
        assert_eq!(numeric(&json!([1, 2]), &[]), None);
        assert_eq!(numeric(&json!(true), &[]), None);
    }

    #[test]
    fn test_numeric_object_prefers_known_subkey() {
        let v = json!({"current": 300, "total": 1200});
        assert_eq!(numeric(&v, NUMERIC_SUBKEYS), Some(1200.0));
    }

    #[test]
    fn test_numeric_object_falls_back_to_first_numeric_value() {
        let v = json!({"label": "gold", "b": 7, "z": 9});
        assert_eq!(numeric(&v, NUMERIC_SUBKEYS), Some(7.0));
        assert_eq!(coerce_numeric(&json!({"label": "x"}), NUMERIC_SUBKEYS), 0.0);
    }

    #[test]
    fn test_field_numeric_falls_back_into_stats() {
        let v = json!({"name": "Faker", "stats": {"totalGold": "4100"}});
        let gold = field_numeric(&v, &["gold", "totalGold"]).unwrap();
        assert_relative_eq!(gold, 4100.0);
        assert_eq!(field_numeric(&v, &["xp"]), None);
    }

    #[test]
    fn test_field_numeric_top_level_wins_over_stats() {
        let v = json!({"gold": 10, "stats": {"totalGold": 99}});
        assert_eq!(field_numeric(&v, &["totalGold", "gold"]), Some(10.0));
    }

    #[test]
    fn test_identifier_forms() {
        assert_eq!(identifier(&json!(7)), Some("7".to_string()));
        assert_eq!(identifier(&json!(7.0)), Some("7".to_string()));
        assert_eq!(identifier(&json!(7.5)), None);
        assert_eq!(identifier(&json!(" p1 ")), Some("p1".to_string()));
        assert_eq!(identifier(&json!("")), None);
        assert_eq!(identifier(&json!({"id": 12})), Some("12".to_string()));
    }

    #[test]
    fn test_as_timestamp_clamps_negative() {
        assert_eq!(as_timestamp(&json!(-50)), Some(0));
        assert_eq!(as_timestamp(&json!("60000")), Some(60_000));
    }

    #[test]
    fn test_resolve_first_reports_strategy_name() {
        fn none(_: &Value) -> Option<u8> {
            None
        }
        fn one(_: &Value) -> Option<u8> {
            Some(1)
        }
        let raw = json!({});
        let strategies = [
            Strategy { name: "none", run: none },
            Strategy { name: "one", run: one },
        ];
        assert_eq!(resolve_first(&raw, &strategies), Some(("one", 1)));
    }
}
