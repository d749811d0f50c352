use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::pagination::{PageCapacity, PageGeometry};
use crate::scheduler::SchedulerTiming;

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Capacity used when a request does not name one, and for the live preview.
    pub page_capacity: PageCapacity,
    pub timing: SchedulerTiming,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = SchedulerTiming::default();
        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            page_capacity: resolve_page_capacity(
                optional_env("PAGE_CAPACITY_PX"),
                optional_env("PAGE_MARGIN_TOP_MM"),
                optional_env("PAGE_MARGIN_BOTTOM_MM"),
            )?,
            timing: SchedulerTiming {
                frame_interval: Duration::from_millis(parse_env(
                    "FRAME_INTERVAL_MS",
                    defaults.frame_interval.as_millis() as u64,
                )?),
                settle_delay: Duration::from_millis(parse_env(
                    "SETTLE_DELAY_MS",
                    defaults.settle_delay.as_millis() as u64,
                )?),
            },
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}

/// An explicit pixel capacity wins; otherwise A4 with the given (or default) margins.
fn resolve_page_capacity(
    explicit_px: Option<String>,
    margin_top_mm: Option<String>,
    margin_bottom_mm: Option<String>,
) -> Result<PageCapacity> {
    if let Some(raw) = explicit_px {
        let px: f32 = raw
            .trim()
            .parse()
            .with_context(|| format!("PAGE_CAPACITY_PX must be a number, got {raw}"))?;
        return PageCapacity::new(px).context("PAGE_CAPACITY_PX is out of range");
    }

    let top = parse_margin(margin_top_mm, PageGeometry::A4.margin_top_mm)?;
    let bottom = parse_margin(margin_bottom_mm, PageGeometry::A4.margin_bottom_mm)?;
    PageGeometry::a4_with_margins(top, bottom)
        .capacity()
        .context("Page margins leave no usable height")
}

fn parse_margin(raw: Option<String>, default: f32) -> Result<f32> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<f32>()
            .with_context(|| format!("Page margin must be a number of millimetres, got {raw}")),
        None => Ok(default),
    }
}
