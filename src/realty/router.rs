use super::RealtyStep;
use super::state::RealtyState;
use crate::Route;

/// Strict pipeline: the first missing output picks the step that produces it.
pub fn route_realty(state: &RealtyState) -> Route<RealtyStep> {
    if state.research_data.is_none() {
        Route::To(RealtyStep::Researcher)
    } else if state.valuation_data.is_none() {
        Route::To(RealtyStep::Analyst)
    } else if state.final_report.is_none() {
        Route::To(RealtyStep::Presenter)
    } else {
        Route::End
    }
}
