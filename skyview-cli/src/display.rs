//! Human-friendly rendering, fixed to en-US conventions.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use skyview_core::{CurrentConditions, DailyForecast, WeatherReport};

pub fn report(report: &WeatherReport) -> String {
    let mut out = current(&report.current, &Local);

    if !report.forecast.is_empty() {
        out.push_str("\nForecast\n");
        for day in &report.forecast {
            out.push_str(&forecast_line(day));
            out.push('\n');
        }
    }

    out
}

fn current<Tz: TimeZone>(c: &CurrentConditions, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}\n{}\n{}  {}°C  {}\nFeels like {}°C | Humidity {}% | Wind {} m/s\n",
        place(c),
        date_time(&c.observed_at.with_timezone(tz)),
        c.icon,
        c.temperature_c,
        c.description,
        c.feels_like_c,
        c.humidity_pct,
        c.wind_speed_mps
    )
}

fn place(c: &CurrentConditions) -> String {
    if c.country.is_empty() {
        c.city.clone()
    } else {
        format!("{}, {}", c.city, c.country)
    }
}

/// e.g. "Saturday, June 1, 2024 at 12:00 PM"
fn date_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%A, %B %-d, %Y at %I:%M %p").to_string()
}

/// e.g. "Sat, Jun 1"
fn short_date(date: NaiveDate) -> String {
    date.format("%a, %b %-d").to_string()
}

fn forecast_line(day: &DailyForecast) -> String {
    format!(
        "{:<12}{}  {:>3}°C  {}",
        short_date(day.date),
        day.icon,
        day.temperature_c,
        day.description
    )
}
