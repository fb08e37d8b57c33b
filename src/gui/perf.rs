use egui::{Align2, Context, Ui, Window};

use crate::{frame::FrameContext, perf::PerformanceTracker};

fn optional_label(ui: &mut Ui, name: &str, value: Option<String>) {
    match value {
        Some(value) => ui.label(format!("{}: {}", name, value)),
        None => ui.label(format!("{}: unknown", name)),
    };
}

pub fn perf_info(ctx: &Context, perf_tracker: &PerformanceTracker, frame: Option<&FrameContext>) {
    Window::new("Performance Info")
        .resizable([false, false])
        .pivot(Align2::RIGHT_BOTTOM)
        .show(ctx, |ui| {
            optional_label(
                ui,
                "Frame time",
                perf_tracker
                    .last_frame_time()
                    .map(|time| format!("{}ms", time.as_millis())),
            );
            optional_label(
                ui,
                "Avg frame time",
                perf_tracker
                    .avg_frame_time()
                    .map(|time| format!("{}ms", time.as_millis())),
            );
            optional_label(ui, "FPS", perf_tracker.fps().map(|fps| format!("{:#.2}", fps)));
            if let Some(frame) = frame {
                ui.label(format!("Frame #{}", frame.frame_index));
                ui.label(format!("Animation delta: {:.4}s", frame.delta));
            }
        });
}
