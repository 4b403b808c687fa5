//! Domain models for Weekwise

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Spending categories tracked for every week
///
/// The set is closed and the declaration order is the canonical order used
/// for scanning free text, emitting feedback and writing tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Tuition,
    Housing,
    Food,
    Transportation,
    BooksSupplies,
    Entertainment,
    PersonalCare,
    Technology,
    HealthWellness,
    Miscellaneous,
}

impl Category {
    /// Number of categories in the fixed set
    pub const COUNT: usize = 10;

    /// All categories in canonical order
    pub fn all() -> &'static [Category] {
        &[
            Self::Tuition,
            Self::Housing,
            Self::Food,
            Self::Transportation,
            Self::BooksSupplies,
            Self::Entertainment,
            Self::PersonalCare,
            Self::Technology,
            Self::HealthWellness,
            Self::Miscellaneous,
        ]
    }

    /// Column key (snake_case)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tuition => "tuition",
            Self::Housing => "housing",
            Self::Food => "food",
            Self::Transportation => "transportation",
            Self::BooksSupplies => "books_supplies",
            Self::Entertainment => "entertainment",
            Self::PersonalCare => "personal_care",
            Self::Technology => "technology",
            Self::HealthWellness => "health_wellness",
            Self::Miscellaneous => "miscellaneous",
        }
    }

    /// Human-readable form: the key with underscores replaced by spaces
    ///
    /// This is what free-text entries are matched against.
    pub fn spoken(&self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Label for tables
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tuition => "Tuition",
            Self::Housing => "Housing",
            Self::Food => "Food",
            Self::Transportation => "Transportation",
            Self::BooksSupplies => "Books & Supplies",
            Self::Entertainment => "Entertainment",
            Self::PersonalCare => "Personal Care",
            Self::Technology => "Technology",
            Self::HealthWellness => "Health & Wellness",
            Self::Miscellaneous => "Miscellaneous",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-', '/'], "_");
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coerce an amount to a non-negative finite value
pub fn sanitize_amount(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// One dated snapshot of category spending plus income and aid
///
/// Every category always has an amount; missing ones are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyRecord {
    pub date: NaiveDate,
    expenses: [f64; Category::COUNT],
    income: f64,
    financial_aid: f64,
}

impl WeeklyRecord {
    /// All-zero record for a date
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            expenses: [0.0; Category::COUNT],
            income: 0.0,
            financial_aid: 0.0,
        }
    }

    pub fn amount(&self, category: Category) -> f64 {
        self.expenses[category.index()]
    }

    pub fn set_amount(&mut self, category: Category, amount: f64) {
        self.expenses[category.index()] = sanitize_amount(amount);
    }

    /// Add to a category's amount (voice entries log purchases incrementally)
    ///
    /// The sum saturates at `f64::MAX` rather than overflowing.
    pub fn add_amount(&mut self, category: Category, amount: f64) {
        let current = self.amount(category);
        let sum = (current + sanitize_amount(amount)).min(f64::MAX);
        self.set_amount(category, sum);
    }

    pub fn income(&self) -> f64 {
        self.income
    }

    pub fn set_income(&mut self, income: f64) {
        self.income = sanitize_amount(income);
    }

    pub fn financial_aid(&self) -> f64 {
        self.financial_aid
    }

    pub fn set_financial_aid(&mut self, aid: f64) {
        self.financial_aid = sanitize_amount(aid);
    }

    /// Builder-style setter, mostly for tests and seeding
    pub fn with_amount(mut self, category: Category, amount: f64) -> Self {
        self.set_amount(category, amount);
        self
    }

    pub fn with_income(mut self, income: f64, financial_aid: f64) -> Self {
        self.set_income(income);
        self.set_financial_aid(financial_aid);
        self
    }

    /// (category, amount) pairs in canonical order
    pub fn expenses(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::all().iter().map(move |c| (*c, self.amount(*c)))
    }

    pub fn amounts(&self) -> &[f64] {
        &self.expenses
    }

    pub fn expense_map(&self) -> BTreeMap<Category, f64> {
        self.expenses().collect()
    }

    pub fn total_expense(&self) -> f64 {
        self.expenses.iter().sum()
    }

    /// Income plus financial aid
    pub fn total_income(&self) -> f64 {
        self.income + self.financial_aid
    }

    /// Copy of this record under another date
    pub fn redated(&self, date: NaiveDate) -> Self {
        Self {
            date,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_category_order_and_count() {
        assert_eq!(Category::all().len(), Category::COUNT);
        assert_eq!(Category::all()[0], Category::Tuition);
        assert_eq!(Category::all()[9], Category::Miscellaneous);
        for (i, c) in Category::all().iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn test_category_spoken_form() {
        assert_eq!(Category::BooksSupplies.spoken(), "books supplies");
        assert_eq!(Category::Food.spoken(), "food");
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            Category::from_str("personal care").unwrap(),
            Category::PersonalCare
        );
        assert_eq!(
            Category::from_str("HEALTH_WELLNESS").unwrap(),
            Category::HealthWellness
        );
        assert_eq!(
            "books/supplies".parse::<Category>().unwrap(),
            Category::BooksSupplies
        );
        assert!(Category::from_str("groceries").is_err());
    }

    #[test]
    fn test_record_defaults_to_zero() {
        let record = WeeklyRecord::empty(date(2024, 1, 1));
        assert_eq!(record.expenses().count(), Category::COUNT);
        assert!(record.expenses().all(|(_, a)| a == 0.0));
        assert_eq!(record.total_expense(), 0.0);
    }

    #[test]
    fn test_record_rejects_negative_and_nan() {
        let mut record = WeeklyRecord::empty(date(2024, 1, 1));
        record.set_amount(Category::Food, -20.0);
        record.set_income(f64::NAN);
        assert_eq!(record.amount(Category::Food), 0.0);
        assert_eq!(record.income(), 0.0);
    }

    #[test]
    fn test_add_amount_accumulates() {
        let mut record = WeeklyRecord::empty(date(2024, 1, 1));
        record.add_amount(Category::Food, 12.5);
        record.add_amount(Category::Food, 7.5);
        assert_eq!(record.amount(Category::Food), 20.0);
    }

    #[test]
    fn test_add_amount_saturates() {
        let mut record =
            WeeklyRecord::empty(date(2024, 1, 1)).with_amount(Category::Food, f64::MAX);
        record.add_amount(Category::Food, f64::MAX);
        assert_eq!(record.amount(Category::Food), f64::MAX);
    }

    #[test]
    fn test_totals() {
        let record = WeeklyRecord::empty(date(2024, 1, 1))
            .with_amount(Category::Food, 100.0)
            .with_amount(Category::Housing, 400.0)
            .with_income(800.0, 200.0);
        assert_eq!(record.total_expense(), 500.0);
        assert_eq!(record.total_income(), 1000.0);
    }

    #[test]
    fn test_week_start() {
        // 2024-01-04 is a Thursday
        assert_eq!(week_start(date(2024, 1, 4)), date(2024, 1, 1));
        assert_eq!(week_start(date(2024, 1, 1)), date(2024, 1, 1));
        assert_eq!(week_start(date(2024, 1, 7)), date(2024, 1, 1));
    }
}
