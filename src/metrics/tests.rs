use super::*;
use std::fmt::Write as _;
use tempfile::tempdir;

fn point_line(metric: &str, value: f64, endpoint: &str, status: u16, second: u64) -> String {
    format!(
        concat!(
            r#"{{"type":"Point","metric":"{}","data":{{"time":"2024-05-01T10:{:02}:{:02}.000Z","#,
            r#""value":{},"tags":{{"endpoint":"{}","status":"{}","method":"GET"}}}}}}"#
        ),
        metric,
        second.checked_div(60).unwrap_or(0),
        second.checked_rem(60).unwrap_or(0),
        value,
        endpoint,
        status
    )
}

/// 100 requests with durations spread over 100..=199ms, every 20th failed.
fn uniform_stream() -> Vec<String> {
    let mut lines = Vec::new();
    for i in 0..100_u64 {
        let failed = i.checked_rem(20) == Some(0);
        let status = if failed { 503 } else { 200 };
        let duration = 100.0 + i as f64;
        lines.push(point_line("http_reqs", 1.0, "/api/a", status, i));
        lines.push(point_line("http_req_duration", duration, "/api/a", status, i));
        lines.push(point_line(
            "http_req_failed",
            if failed { 1.0 } else { 0.0 },
            "/api/a",
            status,
            i,
        ));
    }
    lines
}

#[test]
fn parse_point_line_extracts_tags_and_time() -> Result<(), String> {
    let line = point_line("http_req_duration", 123.5, "/api/users", 200, 5);
    let point = parse_metric_line(&line).ok_or_else(|| "Expected a point".to_owned())?;
    if point.kind != MetricKind::RequestDuration {
        return Err(format!("Unexpected kind: {:?}", point.kind));
    }
    if (point.value - 123.5).abs() > f64::EPSILON {
        return Err(format!("Unexpected value: {}", point.value));
    }
    if point.endpoint.as_deref() != Some("/api/users") || point.status != Some(200) {
        return Err(format!("Unexpected tags: {:?}", point));
    }
    if point.time.is_none() {
        return Err("Expected timestamp".to_owned());
    }
    Ok(())
}

#[test]
fn parse_skips_noise_lines() -> Result<(), String> {
    let noise = [
        "",
        "running (0m01.0s), 10/10 VUs, 12 complete and 0 interrupted iterations",
        r#"{"type":"Metric","data":{"name":"http_req_duration","type":"trend","contains":"time"},"metric":"http_req_duration"}"#,
        r#"{"type":"Point","metric":"iteration_duration","data":{"value":10.0}}"#,
        r#"{"type":"Point","metric":"http_reqs","data":{"tags":{}}}"#,
        r#"{"type":"Point","metric":"http_reqs","data":{"value":1"#,
        "{not json at all",
    ];
    for line in noise {
        if let Some(point) = parse_metric_line(line) {
            return Err(format!("Expected '{}' to be skipped, got {:?}", line, point));
        }
    }
    Ok(())
}

#[test]
fn parse_accepts_numeric_status_and_missing_tags() -> Result<(), String> {
    let line = r#"{"type":"Point","metric":"http_req_failed","data":{"value":1,"tags":{"status":429}}}"#;
    let point = parse_metric_line(line).ok_or_else(|| "Expected a point".to_owned())?;
    if point.status != Some(429) || point.endpoint.is_some() || point.time.is_some() {
        return Err(format!("Unexpected point: {:?}", point));
    }
    let bare = r#"{"type":"Point","metric":"vus","data":{"value":7}}"#;
    let point = parse_metric_line(bare).ok_or_else(|| "Expected a point".to_owned())?;
    if point.kind != MetricKind::Concurrency {
        return Err(format!("Unexpected kind: {:?}", point.kind));
    }
    Ok(())
}

#[test]
fn reader_carries_partial_line_between_reads() -> Result<(), String> {
    let mut reader = IncrementalLineReader::new();
    let first = reader.feed(b"alpha\nbra");
    if first != vec!["alpha".to_owned()] {
        return Err(format!("Unexpected first batch: {:?}", first));
    }
    if reader.leftover() != b"bra" || reader.offset() != 9 {
        return Err(format!(
            "Unexpected state: offset={} leftover={:?}",
            reader.offset(),
            reader.leftover()
        ));
    }
    let second = reader.feed(b"vo\r\n\ncharlie\ndel");
    if second != vec!["bravo".to_owned(), "charlie".to_owned()] {
        return Err(format!("Unexpected second batch: {:?}", second));
    }
    if !reader.feed(b"ta").is_empty() {
        return Err("Fragment without newline must not be yielded".to_owned());
    }
    if reader.finish().as_deref() != Some("delta") {
        return Err("Expected final fragment on finish".to_owned());
    }
    if reader.finish().is_some() || reader.offset() != 27 {
        return Err(format!("Unexpected state after finish: {}", reader.offset()));
    }
    Ok(())
}

#[test]
fn reader_joins_multibyte_characters_split_across_reads() -> Result<(), String> {
    let text = "caf\u{e9}\n".as_bytes();
    let (head, tail) = text.split_at(4);
    let mut reader = IncrementalLineReader::new();
    if !reader.feed(head).is_empty() {
        return Err("Partial character must stay buffered".to_owned());
    }
    let lines = reader.feed(tail);
    if lines != vec!["caf\u{e9}".to_owned()] {
        return Err(format!("Unexpected lines: {:?}", lines));
    }
    Ok(())
}

#[test]
fn reader_yields_every_line_once_for_any_split() -> Result<(), String> {
    let stream = uniform_stream().join("\n");
    let bytes = stream.as_bytes();
    for step in [1_usize, 7, 64, 1000] {
        let mut reader = IncrementalLineReader::new();
        let mut lines = Vec::new();
        for chunk in bytes.chunks(step) {
            lines.extend(reader.feed(chunk));
        }
        lines.extend(reader.finish());
        if lines.len() != 300 {
            return Err(format!("step {}: expected 300 lines, got {}", step, lines.len()));
        }
        if lines.join("\n") != stream {
            return Err(format!("step {}: lines were altered", step));
        }
    }
    Ok(())
}

#[test]
fn accumulator_folds_uniform_stream() -> Result<(), String> {
    let mut accumulator = MetricsAccumulator::new(50, 1_000);
    let folded = accumulator.fold_lines(uniform_stream());
    if folded != 300 {
        return Err(format!("Expected 300 folded lines, got {}", folded));
    }
    if accumulator.request_count() != 100 || accumulator.failed_count() != 5 {
        return Err(format!(
            "Unexpected counts: {} / {}",
            accumulator.request_count(),
            accumulator.failed_count()
        ));
    }
    let snapshot = accumulator.live_snapshot();
    if (snapshot.error_rate_pct - 5.0).abs() > 1e-9 {
        return Err(format!("Unexpected error rate: {}", snapshot.error_rate_pct));
    }
    let mean = accumulator.mean_duration_ms();
    if !(100.0..=200.0).contains(&mean) {
        return Err(format!("Mean out of range: {}", mean));
    }
    if snapshot.elapsed_secs != 99 {
        return Err(format!("Unexpected elapsed: {}", snapshot.elapsed_secs));
    }
    if (snapshot.throughput - 1.0).abs() > 1e-9 {
        return Err(format!("Unexpected throughput: {}", snapshot.throughput));
    }
    let bucket = accumulator
        .per_endpoint()
        .get("/api/a")
        .ok_or_else(|| "Missing endpoint bucket".to_owned())?;
    if bucket.requests != 100 || bucket.errors != 5 || bucket.times.len() != 100 {
        return Err(format!("Unexpected bucket: {:?}", bucket));
    }
    if accumulator.failure_statuses().get(&503) != Some(&5) {
        return Err(format!(
            "Unexpected failure statuses: {:?}",
            accumulator.failure_statuses()
        ));
    }
    Ok(())
}

#[test]
fn live_average_uses_recent_window_only() -> Result<(), String> {
    let mut accumulator = MetricsAccumulator::new(50, 1_000);
    for value in 1..=60_u32 {
        accumulator.fold_line(&format!(
            r#"{{"type":"Point","metric":"http_req_duration","data":{{"value":{}}}}}"#,
            value
        ));
    }
    // mean(11..=60) = 35.5
    let snapshot = accumulator.record_snapshot();
    if snapshot.avg_response_time_ms != 36 {
        return Err(format!("Unexpected live avg: {}", snapshot.avg_response_time_ms));
    }
    if accumulator.samples().len() != 60 || accumulator.timeline().len() != 1 {
        return Err("Full sample list or timeline not kept".to_owned());
    }
    if snapshot.throughput != 0.0 || snapshot.elapsed_secs != 0 {
        return Err("Untimed samples must not produce throughput".to_owned());
    }
    Ok(())
}

#[test]
fn sample_cap_sets_truncation_flag() -> Result<(), String> {
    let mut accumulator = MetricsAccumulator::new(5, 10);
    let mut lines = String::new();
    for value in 0..15 {
        writeln!(
            lines,
            r#"{{"type":"Point","metric":"http_req_duration","data":{{"value":{}}}}}"#,
            value
        )
        .map_err(|err| err.to_string())?;
    }
    accumulator.fold_lines(lines.lines());
    if accumulator.samples().len() != 10 || !accumulator.samples_truncated() {
        return Err(format!(
            "Expected truncation at 10, got {} (flag {})",
            accumulator.samples().len(),
            accumulator.samples_truncated()
        ));
    }
    if (accumulator.mean_duration_ms() - 7.0).abs() > 1e-9 {
        return Err(format!("Mean must cover all samples: {}", accumulator.mean_duration_ms()));
    }
    Ok(())
}

#[test]
fn unparseable_lines_do_not_abort_folding() -> Result<(), String> {
    let mut accumulator = MetricsAccumulator::new(50, 100);
    let lines = [
        "INFO[0001] starting".to_owned(),
        point_line("http_reqs", 1.0, "/x", 200, 0),
        "{broken".to_owned(),
        point_line("vus", 4.0, "/x", 200, 1),
    ];
    let folded = accumulator.fold_lines(&lines);
    if folded != 2 || accumulator.skipped_lines() != 2 {
        return Err(format!(
            "Unexpected fold result: {} folded, {} skipped",
            folded,
            accumulator.skipped_lines()
        ));
    }
    if accumulator.concurrency() != 4 || accumulator.peak_concurrency() != 4 {
        return Err("Concurrency gauge not applied".to_owned());
    }
    Ok(())
}

#[test]
fn live_progress_caps_and_labels_phases() -> Result<(), String> {
    let cases = [
        (0, 60, 30, 0, Phase::RampUp),
        (29, 60, 30, 48, Phase::RampUp),
        (30, 60, 30, 50, Phase::Running),
        (54, 60, 10, 90, Phase::Running),
        (58, 60, 10, 97, Phase::CoolDown),
        (600, 60, 10, 99, Phase::CoolDown),
        (5, 0, 0, 0, Phase::Running),
    ];
    for (elapsed, total, ramp, pct, phase) in cases {
        let progress = live_progress(elapsed, total, ramp);
        if progress.pct != pct || progress.phase != phase {
            return Err(format!(
                "live_progress({}, {}, {}) = {:?}, expected {} {:?}",
                elapsed, total, ramp, progress, pct, phase
            ));
        }
    }
    if finished_progress().pct != 100 {
        return Err("Finished progress must be 100".to_owned());
    }
    Ok(())
}

#[test]
fn percentiles_follow_sorted_index_formula() -> Result<(), String> {
    let mut samples: Vec<f64> = (1..=100).map(f64::from).collect();
    samples.reverse();
    let (p95, p99) = compute_percentiles(&samples);
    if p95 != 96 || p99 != 100 {
        return Err(format!("Unexpected percentiles: p95={} p99={}", p95, p99));
    }
    if compute_percentiles(&[]) != (0, 0) {
        return Err("Empty samples must yield zero percentiles".to_owned());
    }
    if compute_percentiles(&[42.4]) != (42, 42) {
        return Err("Single sample must be its own percentile".to_owned());
    }
    Ok(())
}

#[test]
fn tail_reads_only_appended_bytes_and_drains_fragment() -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(async {
        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let path = dir.path().join("out.jsonl");
        let mut tail = ArtifactTail::new(&path);
        let mut accumulator = MetricsAccumulator::new(50, 100);

        let missing = tail
            .poll(&mut accumulator)
            .await
            .map_err(|err| err.to_string())?;
        if missing != 0 {
            return Err("Missing artifact must be a no-op".to_owned());
        }

        let first = point_line("http_reqs", 1.0, "/a", 200, 0);
        let second = point_line("http_reqs", 1.0, "/a", 200, 1);
        let (second_head, second_tail) = second.split_at(20);
        tokio::fs::write(&path, format!("{}\n{}", first, second_head))
            .await
            .map_err(|err| format!("write failed: {}", err))?;
        let folded = tail
            .poll(&mut accumulator)
            .await
            .map_err(|err| err.to_string())?;
        if folded != 1 || accumulator.request_count() != 1 {
            return Err(format!("Expected one folded line, got {}", folded));
        }

        let unchanged = tail
            .poll(&mut accumulator)
            .await
            .map_err(|err| err.to_string())?;
        if unchanged != 0 {
            return Err("Unchanged artifact must be a no-op".to_owned());
        }

        let mut content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| format!("read failed: {}", err))?;
        content.push_str(second_tail);
        tokio::fs::write(&path, &content)
            .await
            .map_err(|err| format!("write failed: {}", err))?;
        let drained = tail
            .drain(&mut accumulator)
            .await
            .map_err(|err| err.to_string())?;
        if drained != 1 || accumulator.request_count() != 2 {
            return Err(format!("Expected unterminated tail to drain, got {}", drained));
        }
        let len = u64::try_from(content.len()).map_err(|err| err.to_string())?;
        if tail.offset() != len {
            return Err(format!("Offset {} != file length {}", tail.offset(), len));
        }
        Ok(())
    })
}
