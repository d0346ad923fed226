//! Inbound settings messages.
//!
//! A settings message is a JSON object with optional numeric keys:
//!
//! | Key | Meaning | Pair |
//! |-----|---------|------|
//! | `l` | Left wheel duty | with `r` |
//! | `r` | Right wheel duty | with `l` |
//! | `f` | Front safe distance (cm) | with `b` |
//! | `b` | Back safe distance (cm) | with `f` |
//!
//! A key is only used when its partner is present too. Each key is read on
//! its own: a key whose value is not a number (a string, `true`, an object)
//! is treated as absent without affecting the others. Parsing never raises:
//! anything that is not a JSON object comes back as
//! [`SettingsParse::NotSettings`] and the dispatcher treats the raw text as a
//! motion token instead.
//!
//! # Example
//!
//! ```
//! use rs_rover::messages::{parse_settings, SettingsParse};
//!
//! let parsed = parse_settings(r#"{"l": 500, "r": 600}"#);
//! let SettingsParse::Settings(msg) = parsed else { panic!() };
//! assert_eq!(msg.duty_pair(), Some((500.0, 600.0)));
//! assert_eq!(msg.distance_pair(), None);
//!
//! let SettingsParse::Settings(msg) = parse_settings(r#"{"l":"fast","f":30,"b":60}"#) else {
//!     panic!()
//! };
//! assert_eq!(msg.l, None);
//! assert_eq!(msg.distance_pair(), Some((30.0, 60.0)));
//!
//! assert_eq!(parse_settings("1"), SettingsParse::NotSettings);
//! ```

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// Decoded settings object. Every key is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsMessage {
    /// Left wheel duty
    #[serde(default)]
    pub l: Option<f64>,
    /// Right wheel duty
    #[serde(default)]
    pub r: Option<f64>,
    /// Front safe distance in centimeters
    #[serde(default)]
    pub f: Option<f64>,
    /// Back safe distance in centimeters
    #[serde(default)]
    pub b: Option<f64>,
}

impl SettingsMessage {
    /// Builds a message carrying only a duty pair.
    pub fn duties(left: f64, right: f64) -> Self {
        Self {
            l: Some(left),
            r: Some(right),
            ..Self::default()
        }
    }

    /// Builds a message carrying only a safe-distance pair.
    pub fn distances(front: f64, back: f64) -> Self {
        Self {
            f: Some(front),
            b: Some(back),
            ..Self::default()
        }
    }

    /// `(l, r)` when both are present.
    pub fn duty_pair(&self) -> Option<(f64, f64)> {
        self.l.zip(self.r)
    }

    /// `(f, b)` when both are present.
    pub fn distance_pair(&self) -> Option<(f64, f64)> {
        self.f.zip(self.b)
    }

    /// True if neither pair is complete.
    pub fn is_empty(&self) -> bool {
        self.duty_pair().is_none() && self.distance_pair().is_none()
    }
}

/// Result of trying to read raw text as a settings message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingsParse {
    /// A JSON object was decoded.
    Settings(SettingsMessage),
    /// Not a settings object; handle as a motion token.
    NotSettings,
}

/// Parses `raw` (surrounding whitespace ignored) as a settings object.
///
/// Returns [`SettingsParse::NotSettings`] for non-JSON, non-objects and
/// trailing garbage. Non-numeric values only blank their own key.
pub fn parse_settings(raw: &str) -> SettingsParse {
    let json = raw.trim().as_bytes();
    if json.first() != Some(&b'{') {
        return SettingsParse::NotSettings;
    }
    if let Ok((msg, used)) = serde_json_core::from_slice::<SettingsMessage>(json) {
        if used == json.len() {
            return SettingsParse::Settings(msg);
        }
    }

    // Well-formed object with at least one non-numeric value: read each key
    // with every other key skipped.
    match serde_json_core::from_slice::<IgnoredAny>(json) {
        Ok((_, used)) if used == json.len() => SettingsParse::Settings(SettingsMessage {
            l: numeric_key::<LeftOnly>(json).and_then(|k| k.l),
            r: numeric_key::<RightOnly>(json).and_then(|k| k.r),
            f: numeric_key::<FrontOnly>(json).and_then(|k| k.f),
            b: numeric_key::<BackOnly>(json).and_then(|k| k.b),
        }),
        _ => SettingsParse::NotSettings,
    }
}

fn numeric_key<'a, K: Deserialize<'a>>(json: &'a [u8]) -> Option<K> {
    serde_json_core::from_slice::<K>(json).ok().map(|(key, _)| key)
}

#[derive(Deserialize)]
struct LeftOnly {
    #[serde(default)]
    l: Option<f64>,
}

#[derive(Deserialize)]
struct RightOnly {
    #[serde(default)]
    r: Option<f64>,
}

#[derive(Deserialize)]
struct FrontOnly {
    #[serde(default)]
    f: Option<f64>,
}

#[derive(Deserialize)]
struct BackOnly {
    #[serde(default)]
    b: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(raw: &str) -> SettingsMessage {
        match parse_settings(raw) {
            SettingsParse::Settings(msg) => msg,
            SettingsParse::NotSettings => panic!("expected settings: {raw}"),
        }
    }

    #[test]
    fn full_message() {
        let msg = settings(r#"{"l":500,"r":500,"f":30,"b":60}"#);
        assert_eq!(msg.duty_pair(), Some((500.0, 500.0)));
        assert_eq!(msg.distance_pair(), Some((30.0, 60.0)));
    }

    #[test]
    fn half_pair_is_not_a_pair() {
        let msg = settings(r#"{"l":500}"#);
        assert_eq!(msg.duty_pair(), None);
        assert!(msg.is_empty());
    }

    #[test]
    fn empty_object_parses_empty() {
        assert!(settings("{}").is_empty());
    }

    #[test]
    fn whitespace_and_newline_ignored() {
        let msg = settings(" {\"f\": 25, \"b\": 35}\n");
        assert_eq!(msg.distance_pair(), Some((25.0, 35.0)));
    }

    #[test]
    fn unknown_keys_ignored() {
        let msg = settings(r#"{"l":1,"r":2,"mode":"fast"}"#);
        assert_eq!(msg.duty_pair(), Some((1.0, 2.0)));
    }

    #[test]
    fn fractional_and_negative_numbers_parse() {
        let msg = settings(r#"{"l":-5,"r":12.5}"#);
        assert_eq!(msg.duty_pair(), Some((-5.0, 12.5)));
    }

    #[test]
    fn tokens_are_not_settings() {
        assert_eq!(parse_settings("1"), SettingsParse::NotSettings);
        assert_eq!(parse_settings("stop"), SettingsParse::NotSettings);
        assert_eq!(parse_settings(""), SettingsParse::NotSettings);
        assert_eq!(parse_settings("[1,2]"), SettingsParse::NotSettings);
    }

    #[test]
    fn malformed_json_is_not_settings() {
        assert_eq!(parse_settings(r#"{"l":500"#), SettingsParse::NotSettings);
        assert_eq!(parse_settings(r#"{"l":"fast","r":1"#), SettingsParse::NotSettings);
        assert_eq!(parse_settings(r#"{"l":1,"r":2} x"#), SettingsParse::NotSettings);
        assert_eq!(parse_settings(r#"{"l":"fast","r":1} x"#), SettingsParse::NotSettings);
    }

    #[test]
    fn non_numeric_value_blanks_only_its_key() {
        let msg = settings(r#"{"l":"fast","r":1,"f":60,"b":60}"#);
        assert_eq!(msg.l, None);
        assert_eq!(msg.r, Some(1.0));
        assert_eq!(msg.duty_pair(), None);
        assert_eq!(msg.distance_pair(), Some((60.0, 60.0)));

        let msg = settings(r#"{"f":true,"b":{"x":1},"l":10,"r":20}"#);
        assert_eq!(msg.distance_pair(), None);
        assert_eq!(msg.duty_pair(), Some((10.0, 20.0)));
    }

    #[test]
    fn null_is_absent() {
        let msg = settings(r#"{"l":null,"r":5}"#);
        assert_eq!(msg.l, None);
        assert!(msg.is_empty());
    }

    #[test]
    fn values_keep_full_precision() {
        let msg = settings(r#"{"l":1023.00001,"r":0}"#);
        assert_eq!(msg.duty_pair(), Some((1023.00001, 0.0)));
    }

    #[test]
    fn constructors() {
        assert_eq!(SettingsMessage::duties(1.0, 2.0).duty_pair(), Some((1.0, 2.0)));
        assert_eq!(SettingsMessage::distances(30.0, 40.0).distance_pair(), Some((30.0, 40.0)));
    }
}
