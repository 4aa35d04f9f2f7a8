//! Draft input for the add and update-price forms.
//!
//! A form with a blank required field is not submitted and keeps its draft.
//! A field that is filled in but does not hold a usable number is rejected
//! with a [`ValidationError`].

use crate::error::ValidationError;
use crate::holding::{AssetCategory, BitcoinPosition, PropertyHolding, StockHolding};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Number,
    OptionalNumber,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    kind: FieldKind,
}

impl Field {
    fn text(label: &'static str) -> Field {
        Field {
            label,
            value: String::new(),
            kind: FieldKind::Text,
        }
    }

    fn number(label: &'static str) -> Field {
        Field {
            label,
            value: String::new(),
            kind: FieldKind::Number,
        }
    }

    fn optional_number(label: &'static str) -> Field {
        Field {
            label,
            value: String::new(),
            kind: FieldKind::OptionalNumber,
        }
    }

    pub fn is_required(&self) -> bool {
        self.kind != FieldKind::OptionalNumber
    }

    fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    fn accepts(&self, c: char) -> bool {
        match self.kind {
            FieldKind::Text => !c.is_control(),
            FieldKind::Number | FieldKind::OptionalNumber => {
                c.is_ascii_digit() || c == '.' || c == '-'
            }
        }
    }
}

/// Parse a user-entered amount. Must be a finite, non-negative number.
pub fn parse_amount(field: &'static str, input: &str) -> Result<f64, ValidationError> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidNumber {
            field,
            input: input.to_string(),
        })?;
    check_amount(field, value)
}

/// Check an already numeric amount against the same rules as typed input.
pub fn check_amount(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Add(AssetCategory),
    UpdatePrice { index: usize },
}

/// A validated form, ready to be applied to the portfolio.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Stock(StockHolding),
    Property(PropertyHolding),
    Bitcoin(BitcoinPosition),
    Cash { amount: f64, yield_rate: Option<f64> },
    StockPrice { index: usize, price: f64 },
}

#[derive(Debug, Clone)]
pub struct Form {
    kind: FormKind,
    fields: Vec<Field>,
    focus: usize,
}

impl Form {
    pub fn add(category: AssetCategory) -> Form {
        let fields = match category {
            AssetCategory::Stocks => vec![
                Field::text("Stock Name"),
                Field::number("Quantity"),
                Field::number("Price"),
            ],
            AssetCategory::RealEstate => vec![
                Field::text("Property Name"),
                Field::number("Market Value"),
            ],
            AssetCategory::Bitcoin => vec![Field::number("BTC Amount"), Field::number("BTC Price")],
            AssetCategory::Cash => vec![
                Field::number("Cash Amount"),
                Field::optional_number("Yield Rate %"),
            ],
        };
        Form {
            kind: FormKind::Add(category),
            fields,
            focus: 0,
        }
    }

    pub fn update_price(index: usize) -> Form {
        Form {
            kind: FormKind::UpdatePrice { index },
            fields: vec![Field::number("New Price")],
            focus: 0,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn title(&self) -> String {
        match self.kind {
            FormKind::Add(category) => format!("Add {category}"),
            FormKind::UpdatePrice { .. } => "Update Price".to_string(),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn focus_previous(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    pub fn input(&mut self, c: char) {
        let field = &mut self.fields[self.focus];
        if field.accepts(c) {
            field.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.fields[self.focus].value.pop();
    }

    #[cfg(test)]
    pub fn set(&mut self, index: usize, value: &str) {
        self.fields[index].value = value.to_string();
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
        self.focus = 0;
    }

    pub fn is_complete(&self) -> bool {
        self.fields
            .iter()
            .all(|field| !field.is_required() || !field.is_blank())
    }

    fn number(&self, index: usize) -> Result<f64, ValidationError> {
        let field = &self.fields[index];
        parse_amount(field.label, &field.value)
    }

    fn optional_number(&self, index: usize) -> Result<Option<f64>, ValidationError> {
        let field = &self.fields[index];
        if field.is_blank() {
            Ok(None)
        } else {
            parse_amount(field.label, &field.value).map(Some)
        }
    }

    /// Validate the draft.
    ///
    /// Returns `Ok(None)` and keeps the draft when a required field is
    /// blank. On success the draft is cleared.
    pub fn submit(&mut self) -> Result<Option<Submission>, ValidationError> {
        if !self.is_complete() {
            return Ok(None);
        }

        let submission = match self.kind {
            FormKind::Add(AssetCategory::Stocks) => Submission::Stock(StockHolding::new(
                self.fields[0].value.trim(),
                self.number(1)?,
                self.number(2)?,
            )),
            FormKind::Add(AssetCategory::RealEstate) => Submission::Property(
                PropertyHolding::new(self.fields[0].value.trim(), self.number(1)?),
            ),
            FormKind::Add(AssetCategory::Bitcoin) => {
                Submission::Bitcoin(BitcoinPosition::new(self.number(0)?, self.number(1)?))
            }
            FormKind::Add(AssetCategory::Cash) => Submission::Cash {
                amount: self.number(0)?,
                yield_rate: self.optional_number(1)?,
            },
            FormKind::UpdatePrice { index } => Submission::StockPrice {
                index,
                price: self.number(0)?,
            },
        };

        self.clear();
        Ok(Some(submission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_stock_form_is_ignored() {
        let mut form = Form::add(AssetCategory::Stocks);
        form.set(0, "AAPL");
        form.set(1, "10");
        assert_eq!(form.submit(), Ok(None));
        // draft survives
        assert_eq!(form.fields()[0].value, "AAPL");
    }

    #[test]
    fn test_whitespace_counts_as_blank() {
        let mut form = Form::add(AssetCategory::RealEstate);
        form.set(0, "   ");
        form.set(1, "100000");
        assert_eq!(form.submit(), Ok(None));
    }

    #[test]
    fn test_complete_stock_form() {
        let mut form = Form::add(AssetCategory::Stocks);
        form.set(0, " AAPL ");
        form.set(1, "10");
        form.set(2, "150.5");
        assert_eq!(
            form.submit(),
            Ok(Some(Submission::Stock(StockHolding::new("AAPL", 10.0, 150.5))))
        );
        assert!(form.fields().iter().all(|f| f.value.is_empty()));
    }

    #[test]
    fn test_zero_is_present() {
        let mut form = Form::add(AssetCategory::Stocks);
        form.set(0, "VOID");
        form.set(1, "0");
        form.set(2, "0");
        assert!(matches!(form.submit(), Ok(Some(Submission::Stock(_)))));
    }

    #[test]
    fn test_invalid_number_rejected_and_draft_kept() {
        let mut form = Form::add(AssetCategory::Bitcoin);
        form.set(0, "1.2.3");
        form.set(1, "50000");
        assert_eq!(
            form.submit(),
            Err(ValidationError::InvalidNumber {
                field: "BTC Amount",
                input: "1.2.3".to_string()
            })
        );
        assert_eq!(form.fields()[1].value, "50000");
    }

    #[test]
    fn test_negative_rejected() {
        let mut form = Form::add(AssetCategory::RealEstate);
        form.set(0, "Cabin");
        form.set(1, "-5");
        assert_eq!(
            form.submit(),
            Err(ValidationError::Negative {
                field: "Market Value",
                value: -5.0
            })
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(
            parse_amount("Price", "inf"),
            Err(ValidationError::NotFinite { field: "Price" })
        );
        assert!(parse_amount("Price", "NaN").is_err());
    }

    #[test]
    fn test_cash_yield_optional() {
        let mut form = Form::add(AssetCategory::Cash);
        form.set(0, "1000");
        assert_eq!(
            form.submit(),
            Ok(Some(Submission::Cash {
                amount: 1000.0,
                yield_rate: None
            }))
        );

        form.set(0, "1000");
        form.set(1, "4.5");
        assert_eq!(
            form.submit(),
            Ok(Some(Submission::Cash {
                amount: 1000.0,
                yield_rate: Some(4.5)
            }))
        );
    }

    #[test]
    fn test_numeric_fields_filter_input() {
        let mut form = Form::update_price(2);
        for c in "12a.5x".chars() {
            form.input(c);
        }
        assert_eq!(form.fields()[0].value, "12.5");
        form.backspace();
        assert_eq!(
            form.submit(),
            Ok(Some(Submission::StockPrice { index: 2, price: 12.0 }))
        );
    }

    #[test]
    fn test_focus_wraps() {
        let mut form = Form::add(AssetCategory::Stocks);
        form.focus_previous();
        assert_eq!(form.focus(), 2);
        form.focus_next();
        assert_eq!(form.focus(), 0);
        form.input('X');
        assert_eq!(form.fields()[0].value, "X");
    }
}
