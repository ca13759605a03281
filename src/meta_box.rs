//! The "Slot Details" metadata form shown on the admin edit screen.

use crate::models::slot::Slot;
use crate::template::escape::{esc_attr, esc_html};

pub const META_BOX_ACTION: &str = "slots_meta_box";
pub const META_BOX_NONCE_FIELD: &str = "slots_meta_box_nonce";

/// Plain decimal for an input's `value`; empty when unset.
fn input_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Rating choices 1, 1.5, ... 5.
fn rating_options() -> impl Iterator<Item = f64> {
    (2..=10).map(|half| half as f64 / 2.0)
}

pub fn render_meta_box(slot: &Slot, nonce: &str, action_url: &str) -> String {
    let mut html = format!(
        "<form method=\"post\" action=\"{}\" class=\"slots-meta-box\">\n<input type=\"hidden\" name=\"{META_BOX_NONCE_FIELD}\" value=\"{}\" />\n<table class=\"form-table\">\n",
        esc_attr(action_url),
        esc_attr(nonce)
    );

    html.push_str(&format!(
        "<tr><th><label>Slot ID</label></th><td><strong>{}</strong><p class=\"description\">Unique identifier for this slot (auto-generated, used for syncing between sites)</p></td></tr>\n",
        esc_html(slot.slot_id.as_deref().unwrap_or("Not assigned yet"))
    ));

    html.push_str("<tr><th><label for=\"slots_star_rating\">Star Rating</label></th><td><select id=\"slots_star_rating\" name=\"slots_star_rating\">");
    for rating in rating_options() {
        let selected = if slot.star_rating == Some(rating) { " selected" } else { "" };
        html.push_str(&format!("<option value=\"{rating}\"{selected}>{rating} Stars</option>"));
    }
    html.push_str("</select><p class=\"description\">Select the star rating for this slot (1 to 5 stars)</p></td></tr>\n");

    html.push_str(&format!(
        "<tr><th><label for=\"slots_provider_name\">Provider Name</label></th><td><input type=\"text\" id=\"slots_provider_name\" name=\"slots_provider_name\" value=\"{}\" class=\"regular-text\" /></td></tr>\n",
        esc_attr(slot.provider_name.as_deref().unwrap_or(""))
    ));
    html.push_str(&format!(
        "<tr><th><label for=\"slots_rtp\">RTP (%)</label></th><td><input type=\"number\" id=\"slots_rtp\" name=\"slots_rtp\" value=\"{}\" min=\"0\" max=\"100\" step=\"0.1\" />%</td></tr>\n",
        input_value(slot.rtp)
    ));
    for (field, label, value) in [
        ("slots_min_wager", "Minimum Wager", slot.min_wager),
        ("slots_max_wager", "Maximum Wager", slot.max_wager),
    ] {
        html.push_str(&format!(
            "<tr><th><label for=\"{field}\">{label}</label></th><td><input type=\"number\" id=\"{field}\" name=\"{field}\" value=\"{}\" min=\"0\" step=\"0.01\" /></td></tr>\n",
            input_value(value)
        ));
    }

    html.push_str("</table>\n<button type=\"submit\" class=\"button button-primary\">Save</button>\n</form>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::test_support::slot;

    #[test]
    fn renders_current_values() {
        let html = render_meta_box(&slot(), "tok", "/api/admin/slots/7/meta");
        assert!(html.contains("name=\"slots_meta_box_nonce\" value=\"tok\""));
        assert!(html.contains("<strong>SLOT000007</strong>"));
        assert!(html.contains("<option value=\"4.5\" selected>4.5 Stars</option>"));
        assert!(html.contains("<option value=\"1\">1 Stars</option>"));
        assert!(html.contains("value=\"NetEnt\""));
        assert!(html.contains("name=\"slots_rtp\" value=\"95.97\""));
        assert!(html.contains("name=\"slots_max_wager\" value=\"50\""));
    }

    #[test]
    fn unassigned_id_and_empty_fields() {
        let mut s = slot();
        s.slot_id = None;
        s.rtp = None;
        s.provider_name = Some("<b>X</b>".into());
        let html = render_meta_box(&s, "tok", "/x");
        assert!(html.contains("Not assigned yet"));
        assert!(html.contains("name=\"slots_rtp\" value=\"\""));
        assert!(html.contains("value=\"&lt;b&gt;X&lt;/b&gt;\""));
    }
}
