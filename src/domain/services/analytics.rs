use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::domain::models::analytics::{
    DateRange, EntityKind, IntervalBucket, IntervalLabel, IntervalStep, LeaderboardRow, Metrics,
    PerformanceReport, PerformanceTotals, TotalsComparison,
};
use crate::domain::models::appointment::AppointmentRecord;
use crate::domain::ports::AnalyticsRepository;
use crate::error::AppError;

pub struct AnalyticsService {
    repo: Arc<dyn AnalyticsRepository>,
    tz: Tz,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn AnalyticsRepository>, tz: Tz) -> Self {
        Self { repo, tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub async fn query_intervals(&self, range: DateRange, step: IntervalStep, agent_id: Option<i64>) -> Result<Vec<IntervalBucket>, AppError> {
        let records = self.repo.list_records(range.from, range.to, agent_id).await?;
        Ok(bucket_intervals(&records, range, step, self.tz))
    }

    pub async fn query_performance_report(&self, range: DateRange, agent_id: Option<i64>) -> Result<PerformanceTotals, AppError> {
        let records = self.repo.list_records(range.from, range.to, agent_id).await?;
        self.totals(&records, range).await
    }

    /// Intervals for the current range plus current and previous totals.
    pub async fn query_performance(
        &self,
        current: DateRange,
        previous: DateRange,
        step: IntervalStep,
        agent_id: Option<i64>,
    ) -> Result<PerformanceReport, AppError> {
        let current_records = self.repo.list_records(current.from, current.to, agent_id).await?;
        let intervals = bucket_intervals(&current_records, current, step, self.tz);
        let current_totals = self.totals(&current_records, current).await?;
        let previous_totals = self.query_performance_report(previous, agent_id).await?;

        debug!(records = current_records.len(), buckets = intervals.len(), "Performance report computed");
        Ok(PerformanceReport {
            intervals,
            totals: TotalsComparison { current: current_totals, previous: previous_totals },
        })
    }

    pub async fn query_leaderboard(&self, kind: EntityKind, current: DateRange, previous: DateRange) -> Result<Vec<LeaderboardRow>, AppError> {
        let current_records = self.repo.list_records(current.from, current.to, None).await?;
        let previous_records = self.repo.list_records(previous.from, previous.to, None).await?;
        Ok(rank_leaderboard(kind, &current_records, &previous_records))
    }

    async fn totals(&self, records: &[AppointmentRecord], range: DateRange) -> Result<PerformanceTotals, AppError> {
        let new_customer_count = self.repo.count_new_customers(range.from, range.to).await?;
        Ok(PerformanceTotals {
            metrics: aggregate(records.iter()),
            new_customer_count,
        })
    }
}

/// Distinct appointment, booking and customer counts plus summed revenue.
pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a AppointmentRecord>) -> Metrics {
    let mut appointments = HashSet::new();
    let mut bookings = HashSet::new();
    let mut customers = HashSet::new();
    let mut revenue = 0.0;

    for record in records {
        appointments.insert(record.appointment_id);
        bookings.insert(record.booking_id);
        customers.insert(record.customer_id);
        revenue += record.total_amount;
    }

    Metrics {
        appt_count: appointments.len() as i64,
        booking_count: bookings.len() as i64,
        customer_count: customers.len() as i64,
        revenue,
    }
}

/// Groups records by local hour of day or local date, emitting a zero bucket
/// for every slot without data.
///
/// Hourly output always has 24 buckets. Daily output has one bucket per local
/// date from the date of `range.from` whose midnight falls before `range.to`.
pub fn bucket_intervals(records: &[AppointmentRecord], range: DateRange, step: IntervalStep, tz: Tz) -> Vec<IntervalBucket> {
    let mut grouped: BTreeMap<IntervalLabel, Vec<&AppointmentRecord>> = BTreeMap::new();
    for record in records {
        let local = record.datetime_start.with_timezone(&tz);
        let label = match step {
            IntervalStep::Hour => IntervalLabel::Hour(local.hour()),
            IntervalStep::Day => IntervalLabel::Date(local.date_naive()),
        };
        grouped.entry(label).or_default().push(record);
    }

    let labels: Vec<IntervalLabel> = match step {
        IntervalStep::Hour => (0..24).map(IntervalLabel::Hour).collect(),
        IntervalStep::Day => {
            let end = range.to.with_timezone(&tz).naive_local();
            let mut date = range.from.with_timezone(&tz).date_naive();
            let mut dates = Vec::new();
            while date.and_time(NaiveTime::MIN) < end {
                dates.push(IntervalLabel::Date(date));
                date += Duration::days(1);
            }
            dates
        }
    };

    labels.into_iter()
        .map(|label| {
            let metrics = grouped.get(&label)
                .map(|rows| aggregate(rows.iter().copied()))
                .unwrap_or_default();
            IntervalBucket::new(label, metrics)
        })
        .collect()
}

/// Per-entity current metrics with a previous-period comparison, ordered by
/// current revenue descending. Ties are broken by ascending entity id.
///
/// Only entities with current activity appear; `previous` is zeroed when the
/// entity had none.
pub fn rank_leaderboard(kind: EntityKind, current: &[AppointmentRecord], previous: &[AppointmentRecord]) -> Vec<LeaderboardRow> {
    let current_groups = group_by_entity(kind, current);
    let previous_groups = group_by_entity(kind, previous);

    let mut rows: Vec<LeaderboardRow> = current_groups.into_iter()
        .map(|(id, (name, records))| {
            let now = aggregate(records);
            let before = previous_groups.get(&id)
                .map(|(_, prev)| aggregate(prev.iter().copied()))
                .unwrap_or_default();
            LeaderboardRow {
                id,
                name,
                current_appt_count: now.appt_count,
                current_booking_count: now.booking_count,
                current_customer_count: now.customer_count,
                current_revenue: now.revenue,
                previous: before,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.current_revenue.total_cmp(&a.current_revenue));
    rows
}

fn group_by_entity(kind: EntityKind, records: &[AppointmentRecord]) -> BTreeMap<i64, (String, Vec<&AppointmentRecord>)> {
    let mut groups: BTreeMap<i64, (String, Vec<&AppointmentRecord>)> = BTreeMap::new();
    for record in records {
        let entity = match kind {
            EntityKind::Agent => record.agent_id.zip(record.agent_name.clone()),
            EntityKind::Service => record.service_name.clone().map(|name| (record.service_id, name)),
        };
        // Records whose entity row is missing are dropped, like an inner join.
        if let Some((id, name)) = entity {
            groups.entry(id).or_insert_with(|| (name, Vec::new())).1.push(record);
        }
    }
    groups
}

/// Parses a range bound: RFC 3339, or a naive datetime/date read in `tz`.
pub fn parse_bound(value: &str, tz: Tz) -> Result<DateTime<Utc>, AppError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(|d| d.and_time(NaiveTime::MIN)))
        .ok_or(AppError::Validation(format!("Invalid datetime: {}", value)))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(AppError::Validation(format!("Datetime does not exist in {}: {}", tz, value)))
}

pub fn parse_range(pair: &[String; 2], tz: Tz) -> Result<DateRange, AppError> {
    let from = parse_bound(&pair[0], tz)?;
    let to = parse_bound(&pair[1], tz)?;
    if to < from {
        return Err(AppError::Validation("Range end must not precede its start".into()));
    }
    Ok(DateRange { from, to })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn record(id: i64, start: DateTime<Utc>, amount: f64) -> AppointmentRecord {
        AppointmentRecord {
            appointment_id: id,
            service_id: 1,
            service_name: Some("Haircut".into()),
            datetime_start: start,
            booking_id: 100 + id,
            customer_id: 1000 + id,
            total_amount: amount,
            agent_id: Some(7),
            agent_name: Some("Ada Lovelace".into()),
        }
    }

    fn range(from: DateTime<Utc>, to: DateTime<Utc>) -> DateRange {
        DateRange { from, to }
    }

    #[test]
    fn test_hourly_buckets_fill_all_day() {
        let records = vec![
            record(1, at(2024, 1, 10, 9, 15), 50.0),
            record(2, at(2024, 1, 10, 9, 45), 30.0),
        ];
        let buckets = bucket_intervals(&records, range(at(2024, 1, 10, 0, 0), at(2024, 1, 10, 23, 59)), IntervalStep::Hour, chrono_tz::UTC);

        assert_eq!(buckets.len(), 24);
        for (hour, bucket) in buckets.iter().enumerate() {
            assert_eq!(bucket.interval_label, IntervalLabel::Hour(hour as u32));
            if hour == 9 {
                assert_eq!(bucket.subtotal_appt_count, 2);
                assert_eq!(bucket.subtotal_booking_count, 2);
                assert_eq!(bucket.subtotal_customer_count, 2);
                assert_eq!(bucket.subtotal_revenue, 80.0);
            } else {
                assert_eq!(bucket.subtotal_appt_count, 0);
                assert_eq!(bucket.subtotal_revenue, 0.0);
            }
        }
    }

    #[test]
    fn test_daily_buckets_for_empty_range() {
        let buckets = bucket_intervals(&[], range(at(2024, 1, 1, 0, 0), at(2024, 1, 4, 0, 0)), IntervalStep::Day, chrono_tz::UTC);

        let labels: Vec<_> = buckets.iter().map(|b| b.interval_label).collect();
        assert_eq!(labels, vec![
            IntervalLabel::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            IntervalLabel::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
            IntervalLabel::Date(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()),
        ]);
        assert!(buckets.iter().all(|b| b.subtotal_appt_count == 0 && b.subtotal_revenue == 0.0));
    }

    #[test]
    fn test_daily_buckets_include_partial_last_day() {
        let records = vec![record(1, at(2024, 1, 3, 18, 0), 20.0)];
        let buckets = bucket_intervals(&records, range(at(2024, 1, 1, 0, 0), at(2024, 1, 3, 23, 59)), IntervalStep::Day, chrono_tz::UTC);

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[2].subtotal_revenue, 20.0);
    }

    #[test]
    fn test_daily_buckets_cover_every_date_before_end() {
        let records = vec![record(1, at(2024, 1, 3, 5, 0), 40.0)];
        let buckets = bucket_intervals(&records, range(at(2024, 1, 1, 12, 0), at(2024, 1, 3, 6, 0)), IntervalStep::Day, chrono_tz::UTC);

        let labels: Vec<_> = buckets.iter().map(|b| b.interval_label).collect();
        assert_eq!(labels, vec![
            IntervalLabel::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            IntervalLabel::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
            IntervalLabel::Date(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()),
        ]);
        let bucketed: f64 = buckets.iter().map(|b| b.subtotal_revenue).sum();
        assert_eq!(bucketed, aggregate(records.iter()).revenue);
    }

    #[test]
    fn test_hour_uses_reporting_timezone() {
        let records = vec![record(1, at(2024, 1, 10, 9, 0), 10.0)];
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let buckets = bucket_intervals(&records, range(at(2024, 1, 10, 0, 0), at(2024, 1, 11, 0, 0)), IntervalStep::Hour, tz);
        assert_eq!(buckets[10].subtotal_appt_count, 1);
        assert_eq!(buckets[9].subtotal_appt_count, 0);
    }

    #[test]
    fn test_distinct_customer_count() {
        let mut a = record(1, at(2024, 1, 10, 9, 0), 10.0);
        let mut b = record(2, at(2024, 1, 10, 10, 0), 15.0);
        a.customer_id = 5;
        b.customer_id = 5;
        let metrics = aggregate([&a, &b]);
        assert_eq!(metrics.appt_count, 2);
        assert_eq!(metrics.customer_count, 1);
        assert_eq!(metrics.revenue, 25.0);
    }

    #[test]
    fn test_leaderboard_zeroes_missing_previous() {
        let current = vec![record(1, at(2024, 2, 1, 9, 0), 100.0)];
        let rows = rank_leaderboard(EntityKind::Agent, &current, &[]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 7);
        assert_eq!(rows[0].name, "Ada Lovelace");
        assert_eq!(rows[0].current_revenue, 100.0);
        assert_eq!(rows[0].previous, Metrics { appt_count: 0, booking_count: 0, customer_count: 0, revenue: 0.0 });
    }

    #[test]
    fn test_leaderboard_orders_by_revenue_then_id() {
        let mut cheap = record(1, at(2024, 2, 1, 9, 0), 10.0);
        cheap.service_id = 3;
        cheap.service_name = Some("Trim".into());
        let mut tie_high_id = record(2, at(2024, 2, 1, 10, 0), 50.0);
        tie_high_id.service_id = 9;
        tie_high_id.service_name = Some("Color".into());
        let mut tie_low_id = record(3, at(2024, 2, 1, 11, 0), 50.0);
        tie_low_id.service_id = 4;
        tie_low_id.service_name = Some("Perm".into());

        let rows = rank_leaderboard(EntityKind::Service, &[cheap, tie_high_id, tie_low_id], &[]);
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 9, 3]);
    }

    #[test]
    fn test_leaderboard_excludes_previous_only_entities() {
        let mut old = record(1, at(2024, 1, 1, 9, 0), 500.0);
        old.agent_id = Some(8);
        old.agent_name = Some("Grace Hopper".into());
        let current = vec![record(2, at(2024, 2, 1, 9, 0), 10.0)];

        let rows = rank_leaderboard(EntityKind::Agent, &current, &[old]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 7);
    }

    #[test]
    fn test_unassigned_records_skip_agent_board() {
        let mut unassigned = record(1, at(2024, 2, 1, 9, 0), 10.0);
        unassigned.agent_id = None;
        unassigned.agent_name = None;
        assert!(rank_leaderboard(EntityKind::Agent, &[unassigned.clone()], &[]).is_empty());
        assert_eq!(rank_leaderboard(EntityKind::Service, &[unassigned], &[]).len(), 1);
    }

    #[test]
    fn test_parse_bound_formats() {
        let tz: Tz = "America/New_York".parse().unwrap();
        assert_eq!(parse_bound("2024-01-10T09:00:00Z", tz).unwrap(), at(2024, 1, 10, 9, 0));
        assert_eq!(parse_bound("2024-01-10 09:00:00", tz).unwrap(), at(2024, 1, 10, 14, 0));
        assert_eq!(parse_bound("2024-01-10", chrono_tz::UTC).unwrap(), at(2024, 1, 10, 0, 0));
        assert!(parse_bound("yesterday", tz).is_err());
    }

    struct StubRepo {
        records: Vec<AppointmentRecord>,
    }

    #[async_trait::async_trait]
    impl AnalyticsRepository for StubRepo {
        async fn list_records(&self, from: DateTime<Utc>, to: DateTime<Utc>, agent_id: Option<i64>) -> Result<Vec<AppointmentRecord>, AppError> {
            Ok(self.records.iter()
                .filter(|r| r.datetime_start >= from && r.datetime_start <= to)
                .filter(|r| agent_id.is_none() || r.agent_id == agent_id)
                .cloned()
                .collect())
        }

        async fn count_new_customers(&self, _from: DateTime<Utc>, _to: DateTime<Utc>) -> Result<i64, AppError> {
            Ok(4)
        }
    }

    #[tokio::test]
    async fn test_service_queries_scope_by_agent() {
        let mut other = record(2, at(2024, 1, 10, 11, 0), 40.0);
        other.agent_id = Some(8);
        let repo = StubRepo { records: vec![record(1, at(2024, 1, 10, 9, 0), 60.0), other] };
        let service = AnalyticsService::new(Arc::new(repo), chrono_tz::UTC);
        let day = range(at(2024, 1, 10, 0, 0), at(2024, 1, 11, 0, 0));

        let buckets = service.query_intervals(day, IntervalStep::Day, Some(7)).await.unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].subtotal_revenue, 60.0);

        let totals = service.query_performance_report(day, None).await.unwrap();
        assert_eq!(totals.metrics.appt_count, 2);
        assert_eq!(totals.metrics.revenue, 100.0);
        assert_eq!(totals.new_customer_count, 4);
    }

    #[test]
    fn test_parse_range_rejects_inverted() {
        let pair = ["2024-01-10".to_string(), "2024-01-09".to_string()];
        assert!(matches!(parse_range(&pair, chrono_tz::UTC), Err(AppError::Validation(_))));
    }
}
