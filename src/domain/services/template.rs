//! Placeholder substitution for stored message templates.
//!
//! Templates use single-brace placeholders such as `{program}`. Only the
//! names in [`PLACEHOLDERS`] are substituted; anything else, including a
//! recognized placeholder without a value, is left verbatim.

use std::collections::HashMap;

use crate::domain::models::reservation::ReservationDetail;

pub type TemplateVars = HashMap<String, String>;

pub const PLACEHOLDERS: [&str; 6] = ["date", "time", "program", "instructor", "studio", "capacity"];

pub fn render(template: &str, vars: &TemplateVars) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        let Some(close) = after_open.find(['}', '{']) else {
            out.push_str(&rest[open..]);
            return out;
        };

        // A second `{` before the closing brace: emit this one and rescan from the next.
        if after_open.as_bytes()[close] == b'{' {
            out.push('{');
            rest = after_open;
            continue;
        }

        let key = &after_open[..close];
        match vars.get(key) {
            Some(value) if PLACEHOLDERS.contains(&key) => out.push_str(value),
            _ => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after_open[close + 1..];
    }

    out.push_str(rest);
    out
}

/// Variables available to templates for one reservation.
pub fn reservation_vars(detail: &ReservationDetail) -> TemplateVars {
    let mut vars = TemplateVars::new();
    vars.insert("date".to_string(), detail.slot_date.format("%Y-%m-%d").to_string());
    vars.insert("time".to_string(), detail.start_time.format("%H:%M").to_string());
    vars.insert("program".to_string(), detail.program_name.clone());
    vars.insert("instructor".to_string(), detail.instructor_name.clone());
    vars.insert("studio".to_string(), detail.studio_name.clone());
    vars.insert("capacity".to_string(), detail.capacity.to_string());
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> TemplateVars {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_render_known_placeholders() {
        let rendered = render("{program} at {time}", &vars(&[("program", "Yoga"), ("time", "10:00")]));
        assert_eq!(rendered, "Yoga at 10:00");
    }

    #[test]
    fn test_missing_variable_left_verbatim() {
        let rendered = render("{program} in {studio}", &vars(&[("program", "Yoga")]));
        assert_eq!(rendered, "Yoga in {studio}");
    }

    #[test]
    fn test_unrecognized_placeholder_left_verbatim() {
        let rendered = render("Hi {name}, {program}", &vars(&[("name", "Ann"), ("program", "Pilates")]));
        assert_eq!(rendered, "Hi {name}, Pilates");
    }

    #[test]
    fn test_repeated_placeholder_and_stray_braces() {
        let v = vars(&[("date", "2026-10-15")]);
        assert_eq!(render("{date} / {date}", &v), "2026-10-15 / 2026-10-15");
        assert_eq!(render("{ {date} }", &v), "{ 2026-10-15 }");
        assert_eq!(render("open {date", &v), "open {date");
        assert_eq!(render("}{}", &v), "}{}");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let rendered = render("{program}", &vars(&[("program", "{time}"), ("time", "10:00")]));
        assert_eq!(rendered, "{time}");
    }
}
