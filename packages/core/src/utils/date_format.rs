//! Timestamp formatting
//!
//! One formatting function for every place a note timestamp is shown. The
//! options mirror the familiar `{locale, dateStyle, timeStyle}` triple; month
//! and weekday names come from chrono's locale tables.
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use notespace_core::utils::{format_timestamp, DateFormatOptions, DateStyle, DisplayLocale};
//!
//! let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
//! let options = DateFormatOptions {
//!     locale: DisplayLocale::EnUs,
//!     date_style: Some(DateStyle::Medium),
//!     time_style: Some(DateStyle::Short),
//! };
//! assert_eq!(format_timestamp(ts, &options), "Mar 5, 2024, 2:07 PM");
//! ```

use chrono::{DateTime, Locale, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported display locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayLocale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "en-GB")]
    EnGb,
    #[serde(rename = "de-DE")]
    DeDe,
    #[serde(rename = "fr-FR")]
    FrFr,
}

impl DisplayLocale {
    fn chrono_locale(self) -> Locale {
        match self {
            DisplayLocale::EnUs => Locale::en_US,
            DisplayLocale::EnGb => Locale::en_GB,
            DisplayLocale::DeDe => Locale::de_DE,
            DisplayLocale::FrFr => Locale::fr_FR,
        }
    }

    fn date_pattern(self, style: DateStyle) -> &'static str {
        use self::DateStyle::*;
        match (self, style) {
            (DisplayLocale::EnUs, Full) => "%A, %B %-d, %Y",
            (DisplayLocale::EnUs, Long) => "%B %-d, %Y",
            (DisplayLocale::EnUs, Medium) => "%b %-d, %Y",
            (DisplayLocale::EnUs, Short) => "%-m/%-d/%y",
            (DisplayLocale::EnGb, Full) => "%A, %-d %B %Y",
            (DisplayLocale::EnGb, Long) => "%-d %B %Y",
            (DisplayLocale::EnGb, Medium) => "%-d %b %Y",
            (DisplayLocale::EnGb, Short) => "%d/%m/%Y",
            (DisplayLocale::DeDe, Full) => "%A, %-d. %B %Y",
            (DisplayLocale::DeDe, Long) => "%-d. %B %Y",
            (DisplayLocale::DeDe, Medium) => "%d.%m.%Y",
            (DisplayLocale::DeDe, Short) => "%d.%m.%y",
            (DisplayLocale::FrFr, Full) => "%A %-d %B %Y",
            (DisplayLocale::FrFr, Long) => "%-d %B %Y",
            (DisplayLocale::FrFr, Medium) => "%-d %b %Y",
            (DisplayLocale::FrFr, Short) => "%d/%m/%Y",
        }
    }

    fn time_pattern(self, style: DateStyle) -> &'static str {
        use self::DateStyle::*;
        match (self, style) {
            (DisplayLocale::EnUs, Short) => "%-I:%M %p",
            (DisplayLocale::EnUs, Medium) => "%-I:%M:%S %p",
            (DisplayLocale::EnUs, Long | Full) => "%-I:%M:%S %p UTC",
            (_, Short) => "%H:%M",
            (_, Medium) => "%H:%M:%S",
            (_, Long | Full) => "%H:%M:%S UTC",
        }
    }

    /// Separator placed between the date and time parts
    fn joiner(self, date_style: DateStyle) -> &'static str {
        match (self, date_style) {
            (DisplayLocale::EnUs, DateStyle::Full | DateStyle::Long) => " at ",
            (DisplayLocale::FrFr, DateStyle::Full | DateStyle::Long) => " à ",
            (DisplayLocale::DeDe, DateStyle::Full | DateStyle::Long) => " um ",
            (DisplayLocale::EnUs, _) => ", ",
            _ => " ",
        }
    }
}

impl fmt::Display for DisplayLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            DisplayLocale::EnUs => "en-US",
            DisplayLocale::EnGb => "en-GB",
            DisplayLocale::DeDe => "de-DE",
            DisplayLocale::FrFr => "fr-FR",
        };
        f.write_str(tag)
    }
}

impl FromStr for DisplayLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('_', "-").to_ascii_lowercase().as_str() {
            "en" | "en-us" => Ok(DisplayLocale::EnUs),
            "en-gb" => Ok(DisplayLocale::EnGb),
            "de" | "de-de" => Ok(DisplayLocale::DeDe),
            "fr" | "fr-fr" => Ok(DisplayLocale::FrFr),
            other => Err(format!("Unsupported locale: {}", other)),
        }
    }
}

/// Verbosity of the date or time part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    Full,
    Long,
    Medium,
    Short,
}

impl FromStr for DateStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(DateStyle::Full),
            "long" => Ok(DateStyle::Long),
            "medium" => Ok(DateStyle::Medium),
            "short" => Ok(DateStyle::Short),
            other => Err(format!("Unsupported style: {}", other)),
        }
    }
}

/// Formatting configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFormatOptions {
    #[serde(default)]
    pub locale: DisplayLocale,
    #[serde(default)]
    pub date_style: Option<DateStyle>,
    #[serde(default)]
    pub time_style: Option<DateStyle>,
}

impl Default for DateFormatOptions {
    fn default() -> Self {
        Self {
            locale: DisplayLocale::EnUs,
            date_style: Some(DateStyle::Medium),
            time_style: Some(DateStyle::Short),
        }
    }
}

/// Render a UTC timestamp according to `options`.
///
/// When neither style is set the medium date is rendered.
pub fn format_timestamp(ts: DateTime<Utc>, options: &DateFormatOptions) -> String {
    let locale = options.locale;
    let chrono_locale = locale.chrono_locale();

    let date_style = match (options.date_style, options.time_style) {
        (None, None) => Some(DateStyle::Medium),
        (date_style, _) => date_style,
    };

    let date_part = date_style.map(|style| {
        ts.format_localized(locale.date_pattern(style), chrono_locale)
            .to_string()
    });
    let time_part = options.time_style.map(|style| {
        ts.format_localized(locale.time_pattern(style), chrono_locale)
            .to_string()
    });

    match (date_part, time_part, date_style) {
        (Some(date), Some(time), Some(style)) => {
            format!("{}{}{}", date, locale.joiner(style), time)
        }
        (Some(date), None, _) => date,
        (None, Some(time), _) => time,
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    fn options(
        locale: DisplayLocale,
        date_style: Option<DateStyle>,
        time_style: Option<DateStyle>,
    ) -> DateFormatOptions {
        DateFormatOptions {
            locale,
            date_style,
            time_style,
        }
    }

    #[test]
    fn test_default_options() {
        assert_eq!(
            format_timestamp(sample(), &DateFormatOptions::default()),
            "Mar 5, 2024, 2:07 PM"
        );
    }

    #[test]
    fn test_en_us_long_date_only() {
        let opts = options(DisplayLocale::EnUs, Some(DateStyle::Long), None);
        assert_eq!(format_timestamp(sample(), &opts), "March 5, 2024");
    }

    #[test]
    fn test_en_us_short_date() {
        let opts = options(DisplayLocale::EnUs, Some(DateStyle::Short), None);
        assert_eq!(format_timestamp(sample(), &opts), "3/5/24");
    }

    #[test]
    fn test_time_only() {
        let opts = options(DisplayLocale::DeDe, None, Some(DateStyle::Medium));
        assert_eq!(format_timestamp(sample(), &opts), "14:07:09");
    }

    #[test]
    fn test_de_medium_date_and_short_time() {
        let opts = options(
            DisplayLocale::DeDe,
            Some(DateStyle::Medium),
            Some(DateStyle::Short),
        );
        assert_eq!(format_timestamp(sample(), &opts), "05.03.2024 14:07");
    }

    #[test]
    fn test_en_gb_short_date() {
        let opts = options(DisplayLocale::EnGb, Some(DateStyle::Short), None);
        assert_eq!(format_timestamp(sample(), &opts), "05/03/2024");
    }

    #[test]
    fn test_no_styles_falls_back_to_medium_date() {
        let opts = options(DisplayLocale::EnUs, None, None);
        assert_eq!(format_timestamp(sample(), &opts), "Mar 5, 2024");
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!("en_US".parse::<DisplayLocale>().unwrap(), DisplayLocale::EnUs);
        assert_eq!("de".parse::<DisplayLocale>().unwrap(), DisplayLocale::DeDe);
        assert!("xx-YY".parse::<DisplayLocale>().is_err());
        assert_eq!(DisplayLocale::FrFr.to_string(), "fr-FR");
    }
}
