use crate::error::{StateError, ValidationError};
use crate::form::{check_amount, Submission};
use crate::format::{format_amount, format_currency, format_multiplier, format_number};
use crate::holding::{
    AssetCategory, BitcoinPosition, CashBalance, PropertyHolding, StockHolding, Valued,
};
use crate::simulation::{Simulation, SliderPosition};
use piechart::{Chart, Color};
use serde::{Deserialize, Serialize};

/// The whole session state. Every change goes through one of the methods
/// below; values are always derived on read via [`Portfolio::valuation`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Portfolio {
    pub stocks: Vec<StockHolding>,
    pub real_estate: Vec<PropertyHolding>,
    pub bitcoin: BitcoinPosition,
    pub cash: CashBalance,
    pub slider: SliderPosition,
    pub simulation: Option<Simulation>,
}

/// Per-category values at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Valuation {
    pub stocks: f64,
    pub real_estate: f64,
    pub bitcoin: f64,
    pub cash: f64,
}

/// One slice of the allocation chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartSlice {
    pub category: AssetCategory,
    pub value: f64,
    pub active: bool,
}

impl Valuation {
    pub fn total(&self) -> f64 {
        self.stocks + self.real_estate + self.bitcoin + self.cash
    }

    pub fn get(&self, category: AssetCategory) -> f64 {
        match category {
            AssetCategory::Stocks => self.stocks,
            AssetCategory::RealEstate => self.real_estate,
            AssetCategory::Bitcoin => self.bitcoin,
            AssetCategory::Cash => self.cash,
        }
    }

    /// Percentage of the total per category. All zero for an empty portfolio.
    pub fn allocation(&self) -> Vec<(AssetCategory, f64)> {
        let total = self.total();
        AssetCategory::all()
            .iter()
            .map(|&category| {
                let percentage = if total > 0.0 {
                    self.get(category) / total * 100.0
                } else {
                    0.0
                };
                (category, percentage)
            })
            .collect()
    }

    /// Empty categories still get a unit slice so the chart always has
    /// something to draw; they are marked inactive and rendered grey.
    pub fn chart_slices(&self) -> Vec<ChartSlice> {
        AssetCategory::all()
            .iter()
            .map(|&category| {
                let value = self.get(category);
                let active = value > 0.0;
                ChartSlice {
                    category,
                    value: if active { value } else { 1.0 },
                    active,
                }
            })
            .collect()
    }
}

impl Portfolio {
    pub fn new() -> Portfolio {
        Portfolio::default()
    }

    pub fn from_json(data: &str) -> Result<Portfolio, StateError> {
        let mut portfolio: Portfolio = serde_json::from_str(data)?;
        portfolio.validate()?;
        // a stored snapshot may be stale against the stored holdings
        portfolio.resync_simulation();
        Ok(portfolio)
    }

    pub fn from_file(filename: &str) -> Result<Portfolio, StateError> {
        let data = std::fs::read_to_string(filename).map_err(|source| StateError::Read {
            path: filename.to_string(),
            source,
        })?;
        Portfolio::from_json(&data)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for stock in &self.stocks {
            check_amount("Quantity", stock.quantity)?;
            check_amount("Price", stock.price)?;
        }
        for property in &self.real_estate {
            check_amount("Market Value", property.market_value)?;
        }
        check_amount("BTC Amount", self.bitcoin.amount)?;
        check_amount("BTC Price", self.bitcoin.price)?;
        check_amount("Cash Amount", self.cash.amount)?;
        check_amount("Yield Rate %", self.cash.yield_rate)?;
        Ok(())
    }

    pub fn add_stock(&mut self, stock: StockHolding) {
        log::debug!("adding stock {} ({} @ {})", stock.name, stock.quantity, stock.price);
        self.stocks.push(stock);
    }

    pub fn add_property(&mut self, property: PropertyHolding) {
        log::debug!("adding property {} ({})", property.name, property.market_value);
        self.real_estate.push(property);
    }

    pub fn set_bitcoin(&mut self, bitcoin: BitcoinPosition) {
        log::debug!("setting bitcoin to {} @ {}", bitcoin.amount, bitcoin.price);
        self.bitcoin = bitcoin;
        self.resync_simulation();
    }

    /// Replace the cash amount; the yield rate only changes when given.
    pub fn set_cash(&mut self, amount: f64, yield_rate: Option<f64>) {
        log::debug!("setting cash to {amount} (yield {yield_rate:?})");
        self.cash = CashBalance::new(amount, yield_rate.unwrap_or(self.cash.yield_rate));
    }

    pub fn submit(&mut self, submission: Submission) -> Result<(), ValidationError> {
        match submission {
            Submission::Stock(stock) => self.add_stock(stock),
            Submission::Property(property) => self.add_property(property),
            Submission::Bitcoin(bitcoin) => self.set_bitcoin(bitcoin),
            Submission::Cash { amount, yield_rate } => self.set_cash(amount, yield_rate),
            Submission::StockPrice { index, price } => self.update_stock_price(index, price)?,
        }
        Ok(())
    }

    /// Remove a holding. Stocks and real estate are removed by index, keeping
    /// the order of the rest; bitcoin and cash ignore the index and clear the
    /// single position. Returns whether anything was removed.
    pub fn delete(&mut self, category: AssetCategory, index: usize) -> bool {
        log::debug!("deleting {category} #{index}");
        match category {
            AssetCategory::Stocks if index < self.stocks.len() => {
                self.stocks.remove(index);
                true
            }
            AssetCategory::RealEstate if index < self.real_estate.len() => {
                self.real_estate.remove(index);
                true
            }
            AssetCategory::Stocks | AssetCategory::RealEstate => false,
            AssetCategory::Bitcoin => {
                self.bitcoin.clear();
                self.resync_simulation();
                true
            }
            AssetCategory::Cash => {
                self.cash.amount = 0.0;
                true
            }
        }
    }

    pub fn update_stock_price(&mut self, index: usize, price: f64) -> Result<(), ValidationError> {
        let price = check_amount("Price", price)?;
        let stock = self
            .stocks
            .get_mut(index)
            .ok_or(ValidationError::NoSuchHolding { index })?;
        log::debug!("updating price of {} to {price}", stock.name);
        stock.update_price(price);
        Ok(())
    }

    pub fn is_simulating(&self) -> bool {
        self.simulation.is_some()
    }

    pub fn toggle_simulation(&mut self) {
        self.simulation = match self.simulation {
            Some(_) => None,
            None => Some(self.snapshot()),
        };
        log::debug!("simulation active: {}", self.is_simulating());
    }

    /// Move the slider. While simulating, the snapshot follows.
    pub fn set_slider(&mut self, position: u16) {
        self.slider = SliderPosition::new(position);
        self.resync_simulation();
    }

    pub fn step_slider(&mut self, delta: i32) {
        self.set_slider(self.slider.step(delta).get());
    }

    fn snapshot(&self) -> Simulation {
        Simulation::snapshot(self.bitcoin.amount, self.bitcoin.price, self.slider)
    }

    fn resync_simulation(&mut self) {
        if self.simulation.is_some() {
            self.simulation = Some(self.snapshot());
        }
    }

    /// Row label for cash in the balance tables.
    pub fn cash_label(&self) -> String {
        format!("Cash ({}% yield)", format_number(self.cash.yield_rate))
    }

    pub fn bitcoin_value(&self) -> f64 {
        match &self.simulation {
            Some(simulation) => simulation.value(),
            None => self.bitcoin.value(),
        }
    }

    pub fn valuation(&self) -> Valuation {
        Valuation {
            stocks: self.stocks.iter().map(Valued::value).sum(),
            real_estate: self.real_estate.iter().map(Valued::value).sum(),
            bitcoin: self.bitcoin_value(),
            cash: self.cash.value(),
        }
    }

    pub fn get_total_value(&self) -> f64 {
        self.valuation().total()
    }

    // Print the portfolio as a table
    pub fn print(&self, currency: &str) {
        use comfy_table::{
            presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor,
            ContentArrangement, Table,
        };

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_width(100);

        table.set_header(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Class").add_attribute(Attribute::Bold),
            Cell::new("Amount").add_attribute(Attribute::Bold),
            Cell::new("Price").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        let money = |v: f64| Cell::new(format_currency(v, currency)).set_alignment(CellAlignment::Right);
        let right = |s: String| Cell::new(s).set_alignment(CellAlignment::Right);
        let class = |category: AssetCategory| {
            let color = match category {
                AssetCategory::Stocks => TColor::DarkBlue,
                AssetCategory::RealEstate => TColor::DarkCyan,
                AssetCategory::Bitcoin => TColor::DarkYellow,
                AssetCategory::Cash => TColor::DarkGreen,
            };
            Cell::new(category.label()).fg(color)
        };

        for stock in &self.stocks {
            table.add_row(vec![
                Cell::new(&stock.name),
                class(AssetCategory::Stocks),
                right(format_amount(stock.quantity)),
                money(stock.price),
                money(stock.value()),
            ]);
        }

        for property in &self.real_estate {
            table.add_row(vec![
                Cell::new(&property.name),
                class(AssetCategory::RealEstate),
                right("-".to_string()),
                right("-".to_string()),
                money(property.value()),
            ]);
        }

        let (btc_label, btc_amount, btc_price) = match &self.simulation {
            Some(simulation) => (
                format!("BTC (simulated {})", format_multiplier(self.slider.multiplier())),
                simulation.amount,
                simulation.price,
            ),
            None => ("BTC".to_string(), self.bitcoin.amount, self.bitcoin.price),
        };
        table.add_row(vec![
            Cell::new(btc_label),
            class(AssetCategory::Bitcoin),
            right(format_amount(btc_amount)),
            money(btc_price),
            money(self.bitcoin_value()),
        ]);

        table.add_row(vec![
            Cell::new(self.cash_label()),
            class(AssetCategory::Cash),
            right(format_amount(self.cash.amount)),
            right("-".to_string()),
            money(self.cash.value()),
        ]);

        let valuation = self.valuation();
        for &category in AssetCategory::all() {
            table.add_row(vec![
                Cell::new(format!("{category} subtotal")).add_attribute(Attribute::Italic),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
                money(valuation.get(category)).add_attribute(Attribute::Italic),
            ]);
        }

        table.add_row(vec![
            Cell::new("TOTAL").add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
            money(valuation.total())
                .add_attribute(Attribute::Bold)
                .fg(TColor::Green),
        ]);

        println!("{table}");
    }

    // Print the allocation in descending order %-wise
    pub fn print_allocation(&self) {
        let mut allocation = self.valuation().allocation();
        allocation.sort_by(|a, b| b.1.total_cmp(&a.1));

        println!("====================================");
        for (category, percentage) in allocation {
            println!("{: >12} | {percentage: >10.2}", category.label());
        }
    }

    pub fn draw_pie_chart(&self) {
        let data: Vec<piechart::Data> = self
            .valuation()
            .chart_slices()
            .into_iter()
            .map(|slice| {
                let color = if slice.active {
                    match slice.category {
                        AssetCategory::Stocks => Color::Red,
                        AssetCategory::RealEstate => Color::Blue,
                        AssetCategory::Bitcoin => Color::Yellow,
                        AssetCategory::Cash => Color::Green,
                    }
                } else {
                    Color::White
                };
                piechart::Data {
                    label: slice.category.label().to_string(),
                    value: slice.value as f32,
                    color: Some(color.into()),
                    fill: '•',
                }
            })
            .collect();

        Chart::new()
            .legend(true)
            .radius(9)
            .aspect_ratio(3)
            .draw(&data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * b.abs().max(1.0)
    }

    fn sample() -> Portfolio {
        let mut portfolio = Portfolio::new();
        portfolio.add_stock(StockHolding::new("A", 10.0, 5.0));
        portfolio.add_stock(StockHolding::new("B", 2.0, 100.0));
        portfolio.add_stock(StockHolding::new("C", 1.0, 1.0));
        portfolio.add_property(PropertyHolding::new("Flat", 200_000.0));
        portfolio.set_bitcoin(BitcoinPosition::new(2.0, 50_000.0));
        portfolio.set_cash(1000.0, Some(5.0));
        portfolio
    }

    #[test]
    fn test_empty_portfolio_is_zero() {
        let valuation = Portfolio::new().valuation();
        assert_eq!(valuation, Valuation::default());
        assert_eq!(valuation.total(), 0.0);
        assert!(valuation.allocation().iter().all(|(_, p)| *p == 0.0));
    }

    #[test]
    fn test_valuation() {
        let valuation = sample().valuation();
        assert!(close(valuation.stocks, 251.0));
        assert!(close(valuation.real_estate, 200_000.0));
        assert!(close(valuation.bitcoin, 100_000.0));
        assert!(close(valuation.cash, 1050.0));
        assert!(close(
            valuation.total(),
            valuation.stocks + valuation.real_estate + valuation.bitcoin + valuation.cash
        ));
    }

    #[test]
    fn test_stock_sum_ignores_order() {
        let mut reversed = sample();
        reversed.stocks.reverse();
        assert!(close(reversed.valuation().stocks, sample().valuation().stocks));
    }

    #[test]
    fn test_delete_stock_keeps_order() {
        let mut portfolio = sample();
        assert!(portfolio.delete(AssetCategory::Stocks, 1));
        let names: Vec<&str> = portfolio.stocks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_delete_out_of_range_is_noop() {
        let mut portfolio = sample();
        assert!(!portfolio.delete(AssetCategory::Stocks, 3));
        assert!(!portfolio.delete(AssetCategory::RealEstate, 1));
        assert_eq!(portfolio, sample());
    }

    #[test]
    fn test_delete_scalar_positions() {
        let mut portfolio = sample();
        assert!(portfolio.delete(AssetCategory::Bitcoin, 0));
        assert_eq!(portfolio.bitcoin, BitcoinPosition::default());
        assert!(portfolio.delete(AssetCategory::Cash, 0));
        assert_eq!(portfolio.cash.amount, 0.0);
        assert_eq!(portfolio.cash.yield_rate, 5.0);
    }

    #[test]
    fn test_bitcoin_and_cash_replace() {
        let mut portfolio = sample();
        portfolio.set_bitcoin(BitcoinPosition::new(1.0, 10.0));
        assert_eq!(portfolio.valuation().bitcoin, 10.0);
        portfolio.set_cash(10.0, None);
        assert!(close(portfolio.valuation().cash, 10.5));
    }

    #[test]
    fn test_cash_label_rounds_yield_rate() {
        let mut portfolio = Portfolio::new();
        portfolio.set_cash(100.0, Some(0.1 + 0.2));
        assert_eq!(portfolio.cash_label(), "Cash (0.3% yield)");
        portfolio.set_cash(100.0, Some(3.5));
        assert_eq!(portfolio.cash_label(), "Cash (3.5% yield)");
    }

    #[test]
    fn test_update_stock_price() {
        let mut portfolio = sample();
        portfolio.update_stock_price(0, 6.0).unwrap();
        assert_eq!(portfolio.stocks[0].price, 6.0);
        assert_eq!(
            portfolio.update_stock_price(9, 6.0),
            Err(ValidationError::NoSuchHolding { index: 9 })
        );
        assert!(portfolio.update_stock_price(0, -1.0).is_err());
        assert_eq!(portfolio.stocks[0].price, 6.0);
    }

    #[test]
    fn test_simulation_default_slider_matches_real() {
        let mut portfolio = Portfolio::new();
        portfolio.set_bitcoin(BitcoinPosition::new(2.0, 50_000.0));
        portfolio.toggle_simulation();
        assert!(portfolio.is_simulating());
        let simulation = portfolio.simulation.unwrap();
        assert!(close(simulation.price, 50_000.0));
        assert!(close(portfolio.valuation().bitcoin, 100_000.0));
    }

    #[test]
    fn test_simulation_slider_moves_only_simulated_price() {
        let mut portfolio = Portfolio::new();
        portfolio.set_bitcoin(BitcoinPosition::new(2.0, 50_000.0));
        portfolio.toggle_simulation();

        portfolio.set_slider(201);
        assert!(close(portfolio.valuation().bitcoin, 200_000.0));

        portfolio.set_slider(300);
        assert!(close(portfolio.valuation().bitcoin, 1_000_000.0));
        assert_eq!(portfolio.bitcoin, BitcoinPosition::new(2.0, 50_000.0));

        portfolio.toggle_simulation();
        assert!(close(portfolio.valuation().bitcoin, 100_000.0));
        assert_eq!(portfolio.slider.get(), 300);
    }

    #[test]
    fn test_simulation_zero_position_wipes_out() {
        let mut portfolio = sample();
        portfolio.toggle_simulation();
        portfolio.set_slider(0);
        assert_eq!(portfolio.valuation().bitcoin, 0.0);
        portfolio.set_slider(401);
        assert_eq!(portfolio.slider.get(), 400);
        assert!(close(portfolio.valuation().bitcoin, 10_000_000.0));
    }

    #[test]
    fn test_simulation_follows_real_bitcoin_changes() {
        let mut portfolio = sample();
        portfolio.set_slider(201);
        portfolio.toggle_simulation();
        portfolio.set_bitcoin(BitcoinPosition::new(1.0, 10_000.0));
        assert!(close(portfolio.valuation().bitcoin, 20_000.0));
    }

    #[test]
    fn test_slider_without_simulation_keeps_real_value() {
        let mut portfolio = sample();
        portfolio.step_slider(100);
        assert_eq!(portfolio.slider.get(), 300);
        assert!(close(portfolio.valuation().bitcoin, 100_000.0));
    }

    #[test]
    fn test_submit() {
        let mut portfolio = Portfolio::new();
        portfolio
            .submit(Submission::Stock(StockHolding::new("X", 1.0, 2.0)))
            .unwrap();
        portfolio
            .submit(Submission::StockPrice { index: 0, price: 3.0 })
            .unwrap();
        assert_eq!(portfolio.valuation().stocks, 3.0);
    }

    #[test]
    fn test_chart_slices() {
        let mut portfolio = Portfolio::new();
        portfolio.set_cash(500.0, None);
        let slices = portfolio.valuation().chart_slices();
        assert_eq!(slices.len(), 4);
        assert_eq!(slices[0], ChartSlice { category: AssetCategory::Stocks, value: 1.0, active: false });
        assert_eq!(slices[3], ChartSlice { category: AssetCategory::Cash, value: 500.0, active: true });
    }

    #[test]
    fn test_allocation() {
        let mut portfolio = Portfolio::new();
        portfolio.set_cash(300.0, None);
        portfolio.add_property(PropertyHolding::new("Lot", 100.0));
        let allocation = portfolio.valuation().allocation();
        assert_eq!(allocation[1], (AssetCategory::RealEstate, 25.0));
        assert_eq!(allocation[3], (AssetCategory::Cash, 75.0));
    }

    #[test]
    fn test_from_json() {
        let data = r#"{
            "stocks": [{"name": "AAPL", "quantity": 10, "price": 150}],
            "bitcoin": {"amount": 0.5, "price": 60000},
            "slider": 201,
            "simulation": {"amount": 0, "price": 0}
        }"#;
        let portfolio = Portfolio::from_json(data).unwrap();
        assert!(portfolio.real_estate.is_empty());
        assert_eq!(portfolio.cash, CashBalance::default());
        // stale snapshot is refreshed on load
        assert!(close(portfolio.valuation().bitcoin, 60_000.0));
    }

    #[test]
    fn test_from_json_rejects_negative() {
        let data = r#"{"real_estate": [{"name": "Hole", "market_value": -1}]}"#;
        assert!(matches!(
            Portfolio::from_json(data),
            Err(StateError::Invalid(ValidationError::Negative { .. }))
        ));
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"cash": {{"amount": 100, "yield_rate": 2}}}}"#).unwrap();
        let portfolio = Portfolio::from_file(file.path().to_str().unwrap()).unwrap();
        assert!(close(portfolio.get_total_value(), 102.0));

        assert!(matches!(
            Portfolio::from_file("/nonexistent/portfolio.json"),
            Err(StateError::Read { .. })
        ));
    }

    #[test]
    fn test_example_data_loads() {
        let portfolio = Portfolio::from_file("example_data.json").unwrap();
        assert!(portfolio.get_total_value() > 0.0);
    }
}
