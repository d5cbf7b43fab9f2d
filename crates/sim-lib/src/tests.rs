//! End-to-end properties of generation followed by interpolation
//!
//! Runs full simulations over several seeds and checks the invariants that
//! must hold for every record regardless of which failures were scheduled.

#[cfg(test)]
mod pipeline_tests {
    use crate::failure::{
        FailureEngine, MAX_CPU_IMPACT, MAX_DISK_IMPACT, MAX_MEMORY_IMPACT, MAX_RESPONSE_MULTIPLIER,
    };
    use crate::interpolation::{
        interpolate_by_server, interpolate_by_server_concurrent, stats, validate_quality,
        InterpolationOptions, Resolution,
    };
    use crate::simulation::{Dataset, Simulation};
    use crate::sink::{read_json_lines, BatchWriter, JsonLinesSink};
    use crate::status::classify;
    use crate::MetricRecord;
    use chrono::{DateTime, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::time::Duration;
    use tempfile::TempDir;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()
    }

    fn dataset(seed: u64) -> Dataset {
        Simulation::builder()
            .seed(seed)
            .start_time(start())
            .build()
            .unwrap()
            .run()
            .unwrap()
    }

    fn assert_record_valid(r: &MetricRecord) {
        assert!((0.0..=100.0).contains(&r.cpu), "cpu {} out of range", r.cpu);
        assert!((0.0..=100.0).contains(&r.memory), "memory {} out of range", r.memory);
        assert!((0.0..=100.0).contains(&r.disk), "disk {} out of range", r.disk);
        assert!(r.response_time_ms >= 1.0);
        assert_eq!(
            classify(r.cpu, r.memory, r.disk, r.response_time_ms),
            r.status,
            "status mismatch for {:?}",
            r
        );
    }

    #[test]
    fn test_generated_records_are_in_range_and_classified() {
        for seed in 0..5 {
            let data = dataset(seed);
            assert_eq!(data.records.len(), data.roster.len() * data.horizon_points);
            data.records.iter().for_each(assert_record_valid);
        }
    }

    #[test]
    fn test_schedule_impacts_stay_bounded() {
        for seed in 0..5 {
            let data = dataset(seed);
            let engine = FailureEngine::new(&data.roster, data.schedule.clone()).unwrap();

            for server in &data.roster {
                for t in 0..data.horizon_points {
                    let impact = engine.impact_at(&server.id, t);
                    assert!(impact.cpu_impact <= MAX_CPU_IMPACT);
                    assert!(impact.memory_impact <= MAX_MEMORY_IMPACT);
                    assert!(impact.disk_impact <= MAX_DISK_IMPACT);
                    assert!(impact.response_time_multiplier >= 1.0);
                    assert!(impact.response_time_multiplier <= MAX_RESPONSE_MULTIPLIER);
                }
            }
        }
    }

    #[test]
    fn test_interpolated_dataset_passes_quality_check() {
        let data = dataset(3);
        for resolution in [
            Resolution::OneMinute,
            Resolution::TwoMinutes,
            Resolution::FiveMinutes,
        ] {
            let options = InterpolationOptions::with_resolution(resolution);
            let output =
                interpolate_by_server(&data.records, &options, &mut StdRng::seed_from_u64(1))
                    .unwrap();

            output.iter().map(|r| &r.record).for_each(assert_record_valid);

            // (n - 1) * k + n per server when originals are kept
            let n = data.horizon_points;
            let k = resolution.points_per_gap();
            let s = stats(&output);
            assert_eq!(s.total, data.roster.len() * ((n - 1) * k + n));
            assert_eq!(s.original_count, data.records.len());

            let report = validate_quality(&data.records, &output);
            assert!(report.is_valid, "{:?}", report.errors);
            assert_eq!(report.quality_score, 100, "{:?}", report.warnings);
        }
    }

    #[test]
    fn test_interpolation_preserves_every_original() {
        let data = dataset(8);
        let output = interpolate_by_server(
            &data.records,
            &InterpolationOptions::default(),
            &mut StdRng::seed_from_u64(2),
        )
        .unwrap();

        let originals: HashSet<String> = output
            .iter()
            .filter(|r| !r.interpolated)
            .map(|r| serde_json::to_string(&r.record).unwrap())
            .collect();
        for record in &data.records {
            assert!(originals.contains(&serde_json::to_string(record).unwrap()));
        }

        for server in &data.roster {
            let series: Vec<_> = output
                .iter()
                .filter(|r| r.record.server_id == server.id)
                .collect();
            assert!(series
                .windows(2)
                .all(|w| w[0].record.timestamp < w[1].record.timestamp));
        }
    }

    #[test]
    fn test_interpolation_is_deterministic_per_seed() {
        let data = dataset(4);
        let options = InterpolationOptions::with_resolution(Resolution::TwoMinutes);
        let run = |seed| {
            interpolate_by_server(&data.records, &options, &mut StdRng::seed_from_u64(seed))
                .unwrap()
        };
        assert_eq!(run(9), run(9));
    }

    #[tokio::test]
    async fn test_concurrent_interpolation_over_full_dataset() {
        let data = dataset(6);
        let options = InterpolationOptions::default();

        let a = interpolate_by_server_concurrent(&data.records, &options, 77)
            .await
            .unwrap();
        let b = interpolate_by_server_concurrent(&data.records, &options, 77)
            .await
            .unwrap();

        assert_eq!(a.records, b.records);
        assert_eq!(a.pairs_skipped, 0);
        assert_eq!(
            a.pairs_interpolated,
            data.roster.len() * (data.horizon_points - 1)
        );
    }

    #[tokio::test]
    async fn test_dataset_round_trips_through_jsonl_sink() {
        let data = dataset(10);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dataset.jsonl");

        let sink = JsonLinesSink::open(&path).await.unwrap();
        let report = BatchWriter::new(100, Duration::ZERO)
            .write_all(&sink, &data.records)
            .await
            .unwrap();
        assert_eq!(report.records, data.records.len());
        assert_eq!(report.batches, data.records.len().div_ceil(100));

        let back: Vec<MetricRecord> = read_json_lines(&path).await.unwrap();
        assert_eq!(back, data.records);
    }
}
