//! Grammar of the automatic reconcile schedules.
//!
//! Schedules use the standard five-field cron format
//! (`minute hour day-of-month month day-of-week`), one of the predefined
//! descriptors (`@daily`, ...) or a fixed interval (`@every 1h30m`).
//! Day-of-week is numbered `0-6` starting at Sunday. A schedule may be
//! prefixed with the time zone it is evaluated in, e.g.
//! `CRON_TZ=Europe/Berlin 0 3 * * *`.

use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use snafu::{OptionExt, ResultExt, Snafu, ensure};

const FIELD_COUNT: usize = 5;
const DAY_OF_WEEK_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const TIME_ZONE_PREFIXES: [&str; 2] = ["CRON_TZ=", "TZ="];

// Sequence of decimal numbers with a unit each, e.g. `1h30m` or `1.5h`
static INTERVAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:ns|us|µs|μs|ms|s|m|h))+$")
        .expect("failed to compile interval regex")
});

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("expected {FIELD_COUNT} fields, found {found}"))]
    FieldCount { found: usize },

    #[snafu(display("unknown descriptor {descriptor:?}"))]
    UnknownDescriptor { descriptor: String },

    #[snafu(display("invalid interval {interval:?}"))]
    InvalidInterval { interval: String },

    #[snafu(display("time zone {time_zone:?} must be followed by a schedule"))]
    MissingSchedule { time_zone: String },

    #[snafu(display("unknown time zone {time_zone:?}"))]
    UnknownTimeZone {
        source: jiff::Error,
        time_zone: String,
    },

    #[snafu(display("day of week {value:?} is out of range 0-6"))]
    DayOfWeekOutOfRange { value: String },

    #[snafu(display("failed to parse schedule"))]
    ParseSchedule { source: ::cron::error::Error },
}

/// Checks that `spec` is a valid schedule.
pub fn validate_cron_spec(spec: &str) -> Result<(), Error> {
    let spec = spec.trim();

    let Some(zoned) = TIME_ZONE_PREFIXES
        .iter()
        .find_map(|prefix| spec.strip_prefix(prefix))
    else {
        return validate_schedule(spec);
    };

    let (time_zone, schedule) = zoned
        .split_once(char::is_whitespace)
        .context(MissingScheduleSnafu { time_zone: zoned })?;
    validate_time_zone(time_zone)?;

    validate_schedule(schedule.trim())
}

// An empty zone is UTC, `Local` is the zone of the scheduler
fn validate_time_zone(time_zone: &str) -> Result<(), Error> {
    if matches!(time_zone, "" | "UTC" | "Local") {
        return Ok(());
    }

    jiff::tz::TimeZone::get(time_zone).context(UnknownTimeZoneSnafu { time_zone })?;
    Ok(())
}

fn validate_schedule(spec: &str) -> Result<(), Error> {
    if let Some(descriptor) = spec.strip_prefix('@') {
        if let Some(interval) = descriptor.strip_prefix("every ") {
            let interval = interval.trim();
            ensure!(
                interval == "0" || INTERVAL_REGEX.is_match(interval),
                InvalidIntervalSnafu { interval }
            );
            return Ok(());
        }

        let expanded = match descriptor {
            "yearly" | "annually" => "0 0 1 1 *",
            "monthly" => "0 0 1 * *",
            "weekly" => "0 0 * * 0",
            "daily" | "midnight" => "0 0 * * *",
            "hourly" => "0 * * * *",
            _ => {
                return UnknownDescriptorSnafu {
                    descriptor: format!("@{descriptor}"),
                }
                .fail();
            }
        };
        return validate_schedule(expanded);
    }

    let fields = spec.split_whitespace().collect::<Vec<_>>();
    let [minute, hour, day_of_month, month, day_of_week] = fields[..] else {
        return FieldCountSnafu {
            found: fields.len(),
        }
        .fail();
    };

    // The scheduler expects a leading seconds field and numbers the days of
    // the week starting at 1, so the days are passed by name.
    let expression = format!(
        "0 {minute} {hour} {day_of_month} {month} {day_of_week}",
        month = normalize_names(month),
        day_of_week = translate_day_of_week(day_of_week)?,
    );
    ::cron::Schedule::from_str(&expression).context(ParseScheduleSnafu)?;

    Ok(())
}

fn translate_day_of_week(field: &str) -> Result<String, Error> {
    let items = field
        .split(',')
        .map(|item| {
            let (range, step) = match item.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (item, None),
            };

            let range = range
                .split('-')
                .map(day_of_week_name)
                .collect::<Result<Vec<_>, _>>()?
                .join("-");

            Ok(match step {
                Some(step) => format!("{range}/{step}"),
                None => range,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(items.join(","))
}

fn day_of_week_name(token: &str) -> Result<String, Error> {
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        return token
            .parse::<usize>()
            .ok()
            .and_then(|day| DAY_OF_WEEK_NAMES.get(day))
            .map(|name| (*name).to_owned())
            .ok_or_else(|| Error::DayOfWeekOutOfRange {
                value: token.to_owned(),
            });
    }

    Ok(normalize_name(token))
}

fn normalize_names(field: &str) -> String {
    field
        .split(',')
        .map(|item| {
            item.split('-')
                .map(normalize_name)
                .collect::<Vec<_>>()
                .join("-")
        })
        .collect::<Vec<_>>()
        .join(",")
}

// Names are case-insensitive, e.g. `MON` and `mon` become `Mon`.
fn normalize_name(token: &str) -> String {
    if !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return token.to_owned();
    }

    let mut chars = token.chars();
    match chars.next() {
        Some(first) => {
            first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
        }
        None => String::new(),
    }
}
