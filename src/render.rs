//! Plain-text views of the store.

use fleetwatch_client::{Device, Diagnostics, Protocol};

use crate::store::{DeviceStore, SampleHistory};

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Samples shown in a sparkline.
pub const SPARKLINE_WIDTH: usize = 20;

/// Render the most recent `width` levels (0-7) as bar characters.
pub fn render_sparkline(levels: &[u8], width: usize) -> String {
    let start = levels.len().saturating_sub(width);
    levels[start..]
        .iter()
        .map(|&v| SPARKLINE_CHARS[v.min(7) as usize])
        .collect()
}

/// Device list as an aligned table. The selected device is marked with `*`.
pub fn device_table(store: &DeviceStore) -> String {
    let rows: Vec<[String; 5]> = store
        .devices()
        .iter()
        .map(|d| {
            [
                d.device_id.clone(),
                d.display_name().to_string(),
                d.address(),
                d.device_status.label().to_string(),
                protocols(d),
            ]
        })
        .collect();

    let header = ["DEVICE", "NAME", "ADDRESS", "STATUS", "PROTOCOLS"];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let selected = store.selected_device_id();
    let mut out = format_row("  ", &header.map(String::from), &widths);
    for (device, row) in store.devices().iter().zip(&rows) {
        let marker = if selected == Some(device.device_id.as_str()) {
            "* "
        } else {
            "  "
        };
        out.push('\n');
        out.push_str(&format_row(marker, row, &widths));
    }
    out
}

fn format_row(marker: &str, cells: &[String; 5], widths: &[usize; 5]) -> String {
    let mut line = marker.to_string();
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i + 1 == cells.len() {
            line.push_str(cell);
        } else {
            line.push_str(&format!("{cell:<width$}  "));
        }
    }
    line.trim_end().to_string()
}

fn protocols(device: &Device) -> String {
    if device.supported_protocols.is_empty() {
        return "-".to_string();
    }
    device
        .supported_protocols
        .iter()
        .map(Protocol::label)
        .collect::<Vec<_>>()
        .join(",")
}

/// One line per received sample: usage, status and the CPU sparkline.
pub fn sample_line(device_id: &str, diagnostics: &Diagnostics, history: Option<&SampleHistory>) -> String {
    let sparkline = history
        .map(|h| render_sparkline(&h.cpu_sparkline(), SPARKLINE_WIDTH))
        .unwrap_or_default();

    format!(
        "{device_id}  cpu {:>5.1}%  mem {:>5.1}%  {:<11}  {}",
        diagnostics.cpu_usage,
        diagnostics.memory_usage,
        diagnostics.device_status.label(),
        sparkline
    )
    .trim_end()
    .to_string()
}

/// Closing summary of a device's retained history.
pub fn history_summary(device_id: &str, history: &SampleHistory) -> String {
    match (history.average_cpu(), history.average_memory()) {
        (Some(cpu), Some(memory)) => format!(
            "{device_id}: {} samples, avg cpu {cpu:.1}%, avg mem {memory:.1}%",
            history.len()
        ),
        _ => format!("{device_id}: no samples"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetwatch_client::{DeviceStatus, DiagnosticsSample};

    #[test]
    fn test_render_sparkline() {
        assert_eq!(render_sparkline(&[0, 3, 7, 9], 10), "▁▄██");
        assert_eq!(render_sparkline(&[0, 1, 2, 3, 4], 2), "▄▅");
        assert_eq!(render_sparkline(&[], 5), "");
    }

    #[test]
    fn test_device_table() {
        let mut store = DeviceStore::new();
        let mut edge = Device::new("edge-01");
        edge.alias = "rack-a".to_string();
        edge.host = "10.0.0.4".to_string();
        edge.port = 8080;
        edge.device_status = DeviceStatus::Healthy;
        edge.supported_protocols = vec![Protocol::Http, Protocol::GrpcStream];
        store.set_devices(vec![edge, Device::new("edge-02")]);
        store.select_device("edge-02");

        let table = device_table(&store);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("  DEVICE"));
        assert!(lines[1].starts_with("  edge-01"));
        assert!(lines[1].contains("rack-a"));
        assert!(lines[1].contains("10.0.0.4:8080"));
        assert!(lines[1].contains(&DeviceStatus::Healthy.label().to_string()));
        assert!(lines[1].ends_with(&format!(
            "{},{}",
            Protocol::Http.label(),
            Protocol::GrpcStream.label()
        )));
        assert!(lines[2].starts_with("* edge-02"));
        assert!(lines[2].ends_with('-'));
    }

    #[test]
    fn test_sample_line() {
        let mut history = SampleHistory::new();
        for (n, cpu) in [0.0, 50.0, 100.0].into_iter().enumerate() {
            history.push(DiagnosticsSample {
                timestamp_ms: n as u64,
                cpu,
                memory: 0.0,
            });
        }
        let diagnostics = Diagnostics {
            cpu_usage: 100.0,
            memory_usage: 7.3,
            ..Diagnostics::default()
        };

        let line = sample_line("edge-01", &diagnostics, Some(&history));
        assert!(line.starts_with("edge-01  cpu 100.0%  mem   7.3%"));
        assert!(line.ends_with("▁▅█"));

        let bare = sample_line("edge-01", &diagnostics, None);
        assert!(!bare.ends_with('█'));
    }

    #[test]
    fn test_history_summary() {
        let mut history = SampleHistory::new();
        assert_eq!(history_summary("edge-01", &history), "edge-01: no samples");

        history.push(DiagnosticsSample {
            timestamp_ms: 1,
            cpu: 10.0,
            memory: 30.0,
        });
        history.push(DiagnosticsSample {
            timestamp_ms: 2,
            cpu: 20.0,
            memory: 50.0,
        });
        assert_eq!(
            history_summary("edge-01", &history),
            "edge-01: 2 samples, avg cpu 15.0%, avg mem 40.0%"
        );
    }
}
