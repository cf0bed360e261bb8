//! Slurm time limits.
//!
//! Slurm accepts time limits written as `minutes`, `minutes:seconds`, `hours:minutes:seconds`,
//! `days-hours`, `days-hours:minutes` and `days-hours:minutes:seconds`. This module parses all
//! of them into a [`Duration`], and renders durations back as `[days-]hours:minutes:seconds`.

use chrono::Duration;
use nom::character::complete::{char, u64 as number};
use nom::combinator::{all_consuming, opt};
use nom::multi::separated_list1;
use nom::sequence::{terminated, tuple};
use nom::IResult;

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("invalid time limit '{0}'")]
pub struct TimeError(pub String);

/// Parse a Slurm time limit.
pub fn parse(input: &str) -> Result<Duration, TimeError> {
    let invalid = || TimeError(input.to_string());
    let (days, fields) = match do_parse(input.trim()) {
        Ok((_, result)) => result,
        Err(_) => return Err(invalid()),
    };
    let (days, hours, minutes, seconds) = match (days, fields.as_slice()) {
        (Some(days), [hours]) => (days, *hours, 0, 0),
        (Some(days), [hours, minutes]) => (days, *hours, *minutes, 0),
        (Some(days), [hours, minutes, seconds]) => (days, *hours, *minutes, *seconds),
        (None, [minutes]) => (0, 0, *minutes, 0),
        (None, [minutes, seconds]) => (0, 0, *minutes, *seconds),
        (None, [hours, minutes, seconds]) => (0, *hours, *minutes, *seconds),
        _ => return Err(invalid()),
    };
    let total = days
        .checked_mul(86_400)
        .and_then(|total| total.checked_add(hours.checked_mul(3_600)?))
        .and_then(|total| total.checked_add(minutes.checked_mul(60)?))
        .and_then(|total| total.checked_add(seconds))
        .filter(|total| *total <= i64::MAX as u64 / 1_000)
        .ok_or_else(invalid)?;

    Ok(Duration::seconds(total as i64))
}

/// Render the given duration as `[days-]hours:minutes:seconds`. Sub-second precision is dropped,
/// and negative durations render as zero.
pub fn format(duration: &Duration) -> String {
    let seconds = duration.num_seconds().max(0);
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let seconds = seconds % 60;

    if days > 0 {
        format!("{}-{:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

fn do_parse(input: &str) -> IResult<&str, (Option<u64>, Vec<u64>)> {
    let days = opt(terminated(number, char('-')));
    let fields = separated_list1(char(':'), number);

    all_consuming(tuple((days, fields)))(input)
}
