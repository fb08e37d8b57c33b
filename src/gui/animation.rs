use std::sync::mpsc::Sender;

use egui::{Align2, ComboBox, Context, Slider, Window};
use skinview_asset::animation::Animation;

use crate::renderer::model::Model;

use super::GuiAction;

fn animation_name(index: usize, animation: &Animation) -> String {
    match &animation.name {
        Some(name) => format!("\"{}\"", name),
        None => format!("Animation #{}", index),
    }
}

pub fn animation_panel(ctx: &Context, model: &Model, gui_actions_tx: &mut Sender<GuiAction>) {
    Window::new("Animation")
        .pivot(Align2::LEFT_TOP)
        .resizable([false, false])
        .show(ctx, |ui| {
            let animator = model.animator();
            ui.label(format!(
                "Model: {}",
                model.label().unwrap_or("<none>")
            ));
            ui.label(format!(
                "Primitives: {}, bones: {}",
                model.primitive_count(),
                animator.skeleton().len()
            ));
            if !model.is_animated() {
                ui.label("Static model");
                return;
            }

            let active = animator.active_index();
            let animations = animator.animations();
            let selected_text = animations
                .get(active)
                .map(|animation| animation_name(active, animation))
                .unwrap_or_default();
            ComboBox::from_label("Clip")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for (index, animation) in animations.iter().enumerate() {
                        let label = animation_name(index, animation);
                        if ui.selectable_label(index == active, label).clicked() && index != active
                        {
                            let _ = gui_actions_tx.send(GuiAction::SelectAnimation(index));
                        }
                    }
                });

            let playing = animator.is_playing();
            let toggle = if playing { "Pause" } else { "Play" };
            if ui.button(toggle).clicked() {
                let _ = gui_actions_tx.send(GuiAction::SetPlaying(!playing));
            }

            let max_time = animator
                .active_animation()
                .map(|animation| animation.max_time)
                .unwrap_or(0.0);
            let mut time = animator.animation_time();
            let slider = Slider::new(&mut time, 0.0..=max_time)
                .text("Time")
                .suffix("s");
            if ui.add_enabled(max_time > 0.0, slider).changed() {
                let _ = gui_actions_tx.send(GuiAction::Seek(time));
            }
        });
}
