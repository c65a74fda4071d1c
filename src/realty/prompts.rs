pub const RESEARCHER_SYSTEM: &str = "You are MarketResearcher, a real estate market data gatherer. \
Given a property location, call tools as needed and produce a concise JSON object with: \
mortgage_rates, local_news, market_trends, comparables (list). Return only JSON.";

pub const ANALYST_SYSTEM: &str = "You are ValuationAnalyst, a quantitative analyst. Using research_data and property_details, \
estimate a base_valuation (USD), confidence_score (0-100), valuation_factors (list of strings), and scenario_analysis if provided. \
Return a compact JSON object with keys: base_valuation, confidence_score, valuation_factors, scenario_analysis.";

pub const PRESENTER_SYSTEM: &str = "You are ClientPresenter, a senior real estate advisor. Given valuation_data, write a polished Markdown report \
with sections: Base Valuation, Key Market Factors, Scenario Analysis.";

/// Query used when a search call carries neither `query` nor `input`.
pub const DEFAULT_QUERY: &str = "real estate market trends";

pub const FALLBACK_REPORT: &str = "# Report\nAn error occurred while generating the report.";

pub fn researcher_user(address: &str) -> String {
    format!("Property location: {address}")
}

pub fn analyst_user(details: &str, research: &str, scenario: &str) -> String {
    format!(
        "Property details: {details}\n\
         Research data: {research}\n\
         Scenario (optional): {scenario}\n\
         Return only JSON."
    )
}

pub fn presenter_user(valuation: &str) -> String {
    format!("Valuation data: {valuation}\nWrite a clear, client-friendly Markdown report.")
}
