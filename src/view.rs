// src/view.rs
//! Client-side view state.
//!
//! A `ViewState` is a snapshot; `update` takes the current snapshot and an
//! `Action` and produces the next one. Nothing here does I/O: the caller
//! performs requests and feeds their outcome back in as actions.
use reqwest::Method;
use serde_json::{Number, Value};

use crate::client::Submission;
use crate::dashboard::{summarize, PortfolioSummary};
use crate::models::{Holding, Stock};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub status: LoadStatus,
    pub holdings: Vec<Holding>,
    pub summary: PortfolioSummary,
    pub form: Option<StockForm>,
    pub error: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            status: LoadStatus::Loading,
            holdings: Vec::new(),
            summary: PortfolioSummary::default(),
            form: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A list fetch has started.
    Refresh,
    Loaded(Vec<Holding>),
    RequestFailed(String),
    OpenCreate,
    /// Opens the form seeded from the listed stock with this id.
    OpenEdit(i64),
    Input(FormField, String),
    /// The form's request succeeded; the list must be fetched again.
    Saved,
}

pub fn update(state: &ViewState, action: Action) -> ViewState {
    let mut next = state.clone();
    match action {
        Action::Refresh => {
            next.status = LoadStatus::Loading;
        }
        Action::Loaded(holdings) => {
            next.summary = summarize(&holdings);
            next.holdings = holdings;
            next.status = LoadStatus::Loaded;
            next.error = None;
        }
        Action::RequestFailed(message) => {
            if next.status == LoadStatus::Loading {
                next.status = LoadStatus::Failed;
            }
            next.error = Some(message);
        }
        Action::OpenCreate => {
            next.form = Some(StockForm::create());
        }
        Action::OpenEdit(id) => {
            match state.holdings.iter().find(|h| h.stock.id == id) {
                Some(holding) => next.form = Some(StockForm::edit(&holding.stock)),
                None => next.error = Some(format!("stock {} is not in the list", id)),
            }
        }
        Action::Input(field, value) => {
            if let Some(form) = next.form.as_mut() {
                form.set(field, value);
            }
        }
        Action::Saved => {
            next.form = None;
            next.error = None;
            next.status = LoadStatus::Loading;
        }
    }
    next
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Ticker,
    Quantity,
    BuyPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

/// One form for both adding and editing. Inputs are kept as typed text.
#[derive(Debug, Clone, PartialEq)]
pub struct StockForm {
    pub mode: FormMode,
    pub name: String,
    pub ticker: String,
    pub quantity: String,
    pub buy_price: String,
}

impl StockForm {
    pub fn create() -> Self {
        StockForm {
            mode: FormMode::Create,
            name: String::new(),
            ticker: String::new(),
            quantity: "1".to_string(),
            buy_price: "0".to_string(),
        }
    }

    pub fn edit(stock: &Stock) -> Self {
        StockForm {
            mode: FormMode::Edit(stock.id),
            name: stock.name.clone(),
            ticker: stock.ticker.clone(),
            quantity: stock.quantity.to_string(),
            buy_price: stock.buy_price.to_string(),
        }
    }

    pub fn set(&mut self, field: FormField, value: String) {
        match field {
            FormField::Name => self.name = value,
            FormField::Ticker => self.ticker = value,
            FormField::Quantity => self.quantity = value,
            FormField::BuyPrice => self.buy_price = value,
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Add Stock",
            FormMode::Edit(_) => "Update Stock",
        }
    }

    /// POST for a new stock, PUT for an existing one. Numeric text is sent as
    /// a JSON number and anything else as the string that was typed.
    pub fn submission(&self) -> Submission {
        let (method, path) = match self.mode {
            FormMode::Create => (Method::POST, "/stocks".to_string()),
            FormMode::Edit(id) => (Method::PUT, format!("/stocks/{}", id)),
        };
        let body = serde_json::json!({
            "name": self.name,
            "ticker": self.ticker,
            "quantity": number_or_text(&self.quantity),
            "buyPrice": number_or_text(&self.buy_price),
        });
        Submission { method, path, body }
    }
}

fn number_or_text(input: &str) -> Value {
    let trimmed = input.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Number(n.into());
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(input.to_string()))
}

/// Display fields for one line of the holdings table.
#[derive(Debug, Clone, PartialEq)]
pub struct StockRow {
    pub id: i64,
    pub name: String,
    pub ticker: String,
    pub quantity: i64,
    pub buy_price: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub gain: f64,
}

pub fn rows(holdings: &[Holding]) -> Vec<StockRow> {
    holdings
        .iter()
        .map(|h| StockRow {
            id: h.stock.id,
            name: h.stock.name.clone(),
            ticker: h.stock.ticker.clone(),
            quantity: h.stock.quantity,
            buy_price: h.stock.buy_price,
            current_price: h.current_price,
            market_value: h.market_value(),
            gain: h.market_value() - h.cost_basis(),
        })
        .collect()
}

const ID_WIDTH: usize = 5;

fn table_line(cells: [&str; 8]) -> String {
    let [id, name, ticker, quantity, buy, price, value, gain] = cells;
    format!(
        "{:>ID_WIDTH$}  {:<24} {:<8} {:>10} {:>12} {:>12} {:>14} {:>12}",
        id, name, ticker, quantity, buy, price, value, gain
    )
}

pub fn render_table(holdings: &[Holding]) -> String {
    let mut lines = vec![table_line([
        "ID", "Name", "Ticker", "Quantity", "Buy Price", "Price", "Value", "Gain",
    ])];
    lines.extend(rows(holdings).iter().map(|row| {
        table_line([
            &row.id.to_string(),
            &row.name,
            &row.ticker,
            &row.quantity.to_string(),
            &money(row.buy_price),
            &money(row.current_price),
            &money(row.market_value),
            &money(row.gain),
        ])
    }));
    lines.join("\n") + "\n"
}

pub fn render_summary(summary: &PortfolioSummary) -> String {
    let mut lines = vec![
        format!("Total Portfolio Value: {}", money(summary.total_value)),
        format!("Top Performing Stock: {}", summary.top_stock),
    ];
    if !summary.breakdown.is_empty() {
        lines.push("Distribution:".to_string());
        lines.extend(summary.breakdown.iter().map(|allocation| {
            format!(
                "  {:<8} {:>6.1}%  {}",
                allocation.ticker,
                allocation.weight * 100.0,
                money(allocation.value)
            )
        }));
    }
    lines.join("\n") + "\n"
}

pub fn render_form(form: &StockForm) -> String {
    [
        format!("[{}]", form.submit_label()),
        format!("  Name:      {}", form.name),
        format!("  Ticker:    {}", form.ticker),
        format!("  Quantity:  {}", form.quantity),
        format!("  Buy Price: {}", form.buy_price),
    ]
    .join("\n")
        + "\n"
}

pub fn render(state: &ViewState) -> String {
    let mut out = match state.status {
        LoadStatus::Loading => "Loading...\n".to_string(),
        LoadStatus::Failed => String::new(),
        LoadStatus::Loaded => {
            format!("{}\n{}", render_summary(&state.summary), render_table(&state.holdings))
        }
    };
    if let Some(form) = &state.form {
        out.push_str(&render_form(form));
    }
    if let Some(error) = &state.error {
        out.push_str(&format!("Error: {}\n", error));
    }
    out
}

/// Summary and priced holdings as one JSON document.
pub fn render_json(state: &ViewState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "summary": state.summary,
        "holdings": state.holdings,
    }))
}

fn money(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", -value)
    } else {
        format!("${:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn holding(id: i64, name: &str, quantity: i64, buy: f64, price: f64) -> Holding {
        Holding {
            stock: Stock {
                id,
                name: name.to_string(),
                ticker: name.to_uppercase(),
                quantity,
                buy_price: buy,
            },
            current_price: price,
        }
    }

    fn loaded() -> ViewState {
        update(
            &ViewState::default(),
            Action::Loaded(vec![
                holding(1, "ibm", 10, 4.0, 5.0),
                holding(2, "msft", 2, 120.0, 100.0),
            ]),
        )
    }

    #[test]
    fn loading_computes_summary() {
        let state = loaded();
        assert_eq!(state.status, LoadStatus::Loaded);
        assert_eq!(state.summary.total_value, 250.0);
        assert_eq!(state.summary.top_stock, "msft");
    }

    #[test]
    fn update_leaves_previous_snapshot_untouched() {
        let before = ViewState::default();
        let after = update(&before, Action::OpenCreate);
        assert!(before.form.is_none());
        assert_eq!(after.form, Some(StockForm::create()));
    }

    #[test]
    fn failed_fetch_is_surfaced() {
        let state = update(&ViewState::default(), Action::RequestFailed("offline".into()));
        assert_eq!(state.status, LoadStatus::Failed);
        assert!(render(&state).contains("Error: offline"));
    }

    #[test]
    fn failed_save_keeps_the_list() {
        let state = update(&loaded(), Action::OpenCreate);
        let state = update(&state, Action::RequestFailed("server answered 500".into()));
        assert_eq!(state.status, LoadStatus::Loaded);
        assert!(state.form.is_some());
        assert_eq!(state.holdings.len(), 2);
    }

    #[test]
    fn edit_form_is_seeded_and_puts() {
        let state = update(&loaded(), Action::OpenEdit(2));
        let state = update(&state, Action::Input(FormField::Quantity, "3".into()));
        let form = state.form.clone().unwrap();
        assert_eq!(form.submit_label(), "Update Stock");

        let submission = form.submission();
        assert_eq!(submission.method, Method::PUT);
        assert_eq!(submission.path, "/stocks/2");
        assert_eq!(
            submission.body,
            json!({"name": "msft", "ticker": "MSFT", "quantity": 3, "buyPrice": 120})
        );
    }

    #[test]
    fn editing_unlisted_stock_reports_error() {
        let state = update(&loaded(), Action::OpenEdit(9));
        assert!(state.form.is_none());
        assert!(state.error.is_some());
    }

    #[test]
    fn create_form_posts_with_defaults() {
        let submission = StockForm::create().submission();
        assert_eq!(submission.method, Method::POST);
        assert_eq!(submission.path, "/stocks");
        assert_eq!(
            submission.body,
            json!({"name": "", "ticker": "", "quantity": 1, "buyPrice": 0})
        );
    }

    #[test]
    fn input_is_passed_through_unvalidated() {
        let mut form = StockForm::create();
        form.set(FormField::Quantity, "-4".into());
        form.set(FormField::BuyPrice, "abc".into());
        let body = form.submission().body;
        assert_eq!(body["quantity"], -4);
        assert_eq!(body["buyPrice"], "abc");
    }

    #[test]
    fn saved_closes_form_and_reloads() {
        let state = update(&loaded(), Action::OpenCreate);
        let state = update(&state, Action::Saved);
        assert!(state.form.is_none());
        assert_eq!(state.status, LoadStatus::Loading);
    }

    #[test]
    fn rows_carry_value_and_gain() {
        let row = &rows(&[holding(1, "ibm", 10, 4.0, 5.0)])[0];
        assert_eq!(row.market_value, 50.0);
        assert_eq!(row.gain, 10.0);
    }

    #[test]
    fn failed_save_shows_the_form_that_was_sent() {
        let state = update(&loaded(), Action::OpenEdit(1));
        let state = update(&state, Action::Input(FormField::Quantity, "lots".into()));
        let state = update(&state, Action::RequestFailed("server answered 400".into()));
        let text = render(&state);
        assert!(text.contains("[Update Stock]"));
        assert!(text.contains("  Quantity:  lots"));
        assert!(text.ends_with("Error: server answered 400\n"));
    }

    #[test]
    fn create_form_renders_add_label() {
        let text = render_form(&StockForm::create());
        assert!(text.starts_with("[Add Stock]\n"));
        assert!(text.contains("  Buy Price: 0"));
    }

    #[test]
    fn json_output_carries_summary_and_prices() {
        let value: serde_json::Value = serde_json::from_str(&render_json(&loaded()).unwrap()).unwrap();
        assert_eq!(value["summary"]["totalValue"], 250.0);
        assert_eq!(value["summary"]["topStock"], "msft");
        assert_eq!(value["summary"]["breakdown"][1]["weight"], 0.8);
        assert_eq!(value["holdings"][0]["currentPrice"], 5.0);
        assert_eq!(value["holdings"][0]["buyPrice"], 4.0);
    }

    #[test]
    fn summary_lists_distribution() {
        let text = render_summary(&loaded().summary);
        assert_eq!(
            text,
            "Total Portfolio Value: $250.00\n\
             Top Performing Stock: msft\n\
             Distribution:\n  \
             IBM        20.0%  $50.00\n  \
             MSFT       80.0%  $200.00\n"
        );
    }

    #[test]
    fn table_shows_money_columns() {
        let table = render_table(&[holding(2, "msft", 2, 120.0, 100.0)]);
        assert!(table.contains("$120.00"));
        assert!(table.contains("-$40.00"));
    }
}
