use crate::model::{Category, DailyRoster, DateRange, RosterEntry, Worker};
use crate::scheduler::{Flag, RunOutput, SlotKind, Violation};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Import de workers depuis CSV : header `id,category[,excluded][,moonlighting]`.
///
/// `moonlighting` : plages `2026-03-02..2026-03-08` séparées par `;`, ou dates seules.
pub fn import_workers_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Worker>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let id = rec.get(0).context("missing id")?.trim();
        let category = rec.get(1).context("missing category")?.trim();
        if id.is_empty() {
            bail!("invalid worker row (empty id)");
        }
        let mut worker = Worker::new(id, parse_category(category)?);
        if let Some(flag) = rec.get(2) {
            let flag = flag.trim();
            if !flag.is_empty() {
                worker.excluded = parse_bool(flag)
                    .with_context(|| format!("invalid excluded value for worker {id}"))?;
            }
        }
        if let Some(ranges) = rec.get(3) {
            let ranges = ranges.trim();
            if !ranges.is_empty() {
                worker.moonlighting = parse_ranges(ranges)
                    .with_context(|| format!("invalid moonlighting value for worker {id}"))?;
            }
        }
        out.push(worker);
    }
    Ok(out)
}

/// Import du planning de jour : header `date,worker,service[,moonlighting][,source]`.
pub fn import_roster_csv<P: AsRef<Path>>(path: P, workers: Vec<Worker>) -> anyhow::Result<DailyRoster> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut roster = DailyRoster {
        workers,
        days: Vec::new(),
    };
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let date = parse_date(rec.get(0).context("missing date")?.trim())
            .with_context(|| format!("roster row {}", line + 1))?;
        let worker = rec.get(1).context("missing worker")?.trim();
        let service = rec.get(2).context("missing service")?.trim();
        if worker.is_empty() || service.is_empty() {
            bail!("invalid roster row {} (empty worker or service)", line + 1);
        }
        let mut entry = RosterEntry::new(worker, service);
        if let Some(flag) = rec.get(3).map(str::trim).filter(|s| !s.is_empty()) {
            entry.moonlighting = parse_bool(flag)
                .with_context(|| format!("invalid moonlighting value on row {}", line + 1))?;
        }
        if let Some(flag) = rec.get(4).map(str::trim).filter(|s| !s.is_empty()) {
            entry.source = parse_bool(flag)
                .with_context(|| format!("invalid source value on row {}", line + 1))?;
        }
        roster.push_entry(date, entry);
    }
    roster.days.sort_by_key(|d| d.date);
    Ok(roster)
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

fn parse_category(s: &str) -> anyhow::Result<Category> {
    match s.to_ascii_lowercase().as_str() {
        "teaching" => Ok(Category::Teaching),
        "direct-care" | "direct_care" | "dc" => Ok(Category::DirectCare),
        other => bail!("unknown category: {other}"),
    }
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

fn parse_ranges(raw: &str) -> anyhow::Result<Vec<DateRange>> {
    raw.split(';')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let part = part.trim();
            let (start, end) = match part.split_once("..") {
                Some((a, b)) => (parse_date(a.trim())?, parse_date(b.trim())?),
                None => {
                    let d = parse_date(part)?;
                    (d, d)
                }
            };
            DateRange::new(start, end).map_err(anyhow::Error::msg)
        })
        .collect()
}

pub fn load_roster_json<P: AsRef<Path>>(path: P) -> anyhow::Result<DailyRoster> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let roster = serde_json::from_slice(&data)
        .with_context(|| format!("parsing roster {}", path.display()))?;
    Ok(roster)
}

/// Export JSON du planning de jour (jolie mise en forme)
pub fn export_roster_json<P: AsRef<Path>>(path: P, roster: &DailyRoster) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(roster)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV des gardes : header `date,teaching,direct-care-1,direct-care-2`
pub fn export_assignments_csv<P: AsRef<Path>>(path: P, output: &RunOutput) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "date",
        SlotKind::Teaching.as_str(),
        SlotKind::DirectCare1.as_str(),
        SlotKind::DirectCare2.as_str(),
    ])?;
    for (date, day) in &output.assignments {
        let date = date.to_string();
        let cell = |slot: SlotKind| day.get(slot).map(|w| w.as_str()).unwrap_or("");
        w.write_record([
            date.as_str(),
            cell(SlotKind::Teaching),
            cell(SlotKind::DirectCare1),
            cell(SlotKind::DirectCare2),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des flags : header `kind,date,week,worker,detail`
pub fn export_flags_csv<P: AsRef<Path>>(path: P, flags: &[Flag]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["kind", "date", "week", "worker", "detail"])?;
    for f in flags {
        let date = f.date.map(|d| d.to_string()).unwrap_or_default();
        let week = f.week.map(|wk| wk.to_string()).unwrap_or_default();
        let worker = f.worker.as_ref().map(|w| w.as_str()).unwrap_or("");
        w.write_record([
            f.kind.as_str(),
            date.as_str(),
            week.as_str(),
            worker,
            f.detail.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des statistiques par worker.
pub fn export_stats_csv<P: AsRef<Path>>(path: P, output: &RunOutput) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "worker",
        "total",
        "weekend",
        "teaching",
        "direct_care_1",
        "direct_care_2",
        "weeks_worked",
        "weekends_worked",
        "missed_weeks",
        "doubles",
    ])?;
    for (worker, s) in &output.stats {
        let numbers = [
            s.total,
            s.weekend,
            s.teaching,
            s.direct_care_1,
            s.direct_care_2,
            s.weeks_worked.len() as u32,
            s.weekends_worked,
            s.missed_weeks.len() as u32,
            s.doubles(),
        ];
        let mut record = vec![worker.as_str().to_string()];
        record.extend(numbers.iter().map(|n| itoa::Buffer::new().format(*n).to_string()));
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des violations : header `kind,date,worker,detail`
pub fn export_violations_csv<P: AsRef<Path>>(path: P, violations: &[Violation]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["kind", "date", "worker", "detail"])?;
    for v in violations {
        let kind = format!("{:?}", v.kind);
        let date = v.date.to_string();
        w.write_record([
            kind.as_str(),
            date.as_str(),
            v.worker.as_str(),
            v.detail.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}
