use std::sync::Arc;

use super::service_metrics::{ServiceMetrics, ALL_CHANNELS};

pub fn render_prometheus(m: &Arc<ServiceMetrics>) -> String {
    let mut out = String::with_capacity(1024);

    write_counter(&mut out, "vulnwatch_vulns_ingested_total", m.vulns_ingested_total());
    write_counter(&mut out, "vulnwatch_evaluation_rounds_total", m.evaluation_rounds_total());
    write_counter(&mut out, "vulnwatch_rules_matched_total", m.rules_matched_total());
    write_counter(&mut out, "vulnwatch_dispatch_rounds_total", m.dispatch_rounds_total());
    write_counter(&mut out, "vulnwatch_cooldown_skips_total", m.cooldown_skips_total());
    write_counter(&mut out, "vulnwatch_round_failures_total", m.round_failures_total());

    write_channel_counter(&mut out, "vulnwatch_channel_success_total", |k| {
        m.channel_success_total(k)
    });
    write_channel_counter(&mut out, "vulnwatch_channel_failure_total", |k| {
        m.channel_failure_total(k)
    });

    let (sum, count) = m.eval_latency_vals();
    write_summary(&mut out, "vulnwatch_eval_latency_us", sum, count);

    out
}

fn write_counter(out: &mut String, name: &str, val: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {val}");
}

fn write_channel_counter(
    out: &mut String,
    name: &str,
    get: impl Fn(vulnwatch_engine::rules::ChannelKind) -> u64,
) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} counter");
    for kind in ALL_CHANNELS {
        let _ = writeln!(out, "{name}{{channel=\"{}\"}} {}", kind.as_str(), get(kind));
    }
}

fn write_summary(out: &mut String, name: &str, sum: u64, count: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} summary");
    let _ = writeln!(out, "{name}_sum {sum}");
    let _ = writeln!(out, "{name}_count {count}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prometheus_output() {
        let m = ServiceMetrics::new();
        m.inc_vulns_ingested();
        let output = render_prometheus(&m);
        assert!(output.contains("vulnwatch_vulns_ingested_total 1"));
        assert!(output.contains("vulnwatch_channel_success_total{channel=\"slack\"} 0"));
        assert!(output.contains("# TYPE vulnwatch_eval_latency_us summary"));
    }
}
