//! Fit panel command handlers

use super::{UpdateAction, UpdateResult};
use crate::message::FitCommand;
use crate::state::AppState;

fn send(frame: Option<String>) -> UpdateResult {
    match frame {
        Some(text) => UpdateResult::action(UpdateAction::SendPanel(text)),
        None => UpdateResult::none(),
    }
}

/// Apply a fit panel command, returning the frame to send if any.
pub fn handle_fit_command(state: &mut AppState, command: FitCommand) -> UpdateResult {
    let fit = &mut state.fit;
    match command {
        FitCommand::DoFit(inputs) => send(Some(fit.do_fit(inputs))),
        FitCommand::Reset => {
            fit.reset();
            UpdateResult::none()
        }
        FitCommand::Back => {
            fit.back();
            UpdateResult::none()
        }
        FitCommand::SelectFunction { name } => send(fit.select_function(&name)),
        FitCommand::OperationText { text } => {
            fit.operation_text_changed(&text);
            UpdateResult::none()
        }
        FitCommand::SelectLibrary { library } => {
            fit.select_library(&library);
            UpdateResult::none()
        }
        FitCommand::SelectTypeFunc { type_func } => {
            fit.select_type_func(&type_func);
            UpdateResult::none()
        }
        FitCommand::SetNoStore { no_store } => {
            fit.set_no_store(no_store);
            UpdateResult::none()
        }
        FitCommand::UpdateRange { low, high } => {
            fit.update_range(low, high);
            UpdateResult::none()
        }
        FitCommand::DrawContour(request) => send(Some(fit.draw_contour(request))),
        FitCommand::DrawScan(request) => send(Some(fit.draw_scan(request))),
        FitCommand::ApplyPars => send(Some(fit.apply_pars())),
        FitCommand::SetContourColor { color } => {
            fit.set_contour_color(color);
            UpdateResult::none()
        }
    }
}
