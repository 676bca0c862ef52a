use std::{
    fmt::Display,
    sync::{LazyLock, RwLock},
};

use mindevc_core::{error::MindevcError, MindevcResult};
use nu_ansi_term::Color;
use ureq::http::{HeaderMap, HeaderName, HeaderValue};

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn disable_color() {
    if let Ok(mut color) = COLOR.write() {
        *color = false;
    }
}

fn color_enabled() -> bool {
    COLOR.read().map(|color| *color).unwrap_or(true)
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if color_enabled() {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Parses `Key: Value` pairs given with `--header`.
pub fn parse_headers(headers: &[String]) -> MindevcResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for header in headers {
        let (key, value) = header.split_once(':').ok_or_else(|| {
            MindevcError::Custom(format!("Invalid header `{header}`: expected `Key: Value`"))
        })?;
        let name: HeaderName = key
            .trim()
            .parse()
            .map_err(|_| MindevcError::Custom(format!("Invalid header name `{}`", key.trim())))?;
        let value: HeaderValue = value
            .trim()
            .parse()
            .map_err(|_| MindevcError::Custom(format!("Invalid value for header `{name}`")))?;
        map.append(name, value);
    }
    Ok(map)
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.2} {}", UNITS[unit])
    }
}
