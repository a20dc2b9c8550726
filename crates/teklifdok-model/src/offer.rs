//! Offer (teklif) records: firm data, line items, and totals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::round2;

/// A numeric field that tolerates legacy string-typed JSON values.
///
/// Old records store quantities and prices as strings, sometimes with
/// Turkish decimal commas ("1.234,56"). Resolution keeps the original
/// text around so the caller can report what failed to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Num(f64),
    Text(String),
}

impl Default for Numeric {
    fn default() -> Self {
        Numeric::Num(0.0)
    }
}

impl Numeric {
    /// Resolve to an f64, or return the unparseable source text.
    pub fn resolve(&self) -> Result<f64, &str> {
        match self {
            Numeric::Num(n) if n.is_finite() => Ok(*n),
            Numeric::Num(_) => Err("non-finite"),
            Numeric::Text(s) => parse_decimal(s).ok_or(s.as_str()),
        }
    }

    /// Resolve with a zero fallback for malformed values.
    pub fn resolve_or_zero(&self) -> f64 {
        self.resolve().unwrap_or(0.0)
    }
}

impl From<f64> for Numeric {
    fn from(n: f64) -> Self {
        Numeric::Num(n)
    }
}

/// Parse a decimal that may use Turkish formatting.
///
/// Accepts "1234.56", "1234,56" and "1.234,56".
pub fn parse_decimal(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        return n.is_finite().then_some(n);
    }
    // Comma as decimal separator, dot as thousands separator
    let normalized: String = trimmed
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// One priced measurement row of an offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Measured parameter name (e.g. "TOZ")
    pub parametre: String,
    /// Measurement method (e.g. "EPA-5")
    pub metot: String,
    /// Quantity
    #[serde(default)]
    pub adet: Numeric,
    /// Unit price
    #[serde(default)]
    pub birim_fiyat: Numeric,
    /// Line total; computed from unit price and quantity when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_fiyat: Option<Numeric>,
}

impl LineItem {
    /// Create a line item with a computed total.
    pub fn new(parametre: impl Into<String>, metot: impl Into<String>, adet: u32, birim_fiyat: f64) -> Self {
        Self {
            parametre: parametre.into(),
            metot: metot.into(),
            adet: Numeric::Num(adet as f64),
            birim_fiyat: Numeric::Num(birim_fiyat),
            top_fiyat: None,
        }
    }

    /// Quantity as an integer, zero when malformed.
    pub fn quantity(&self) -> u32 {
        self.adet.resolve_or_zero().max(0.0) as u32
    }

    /// Line total: the explicit value when provided, otherwise
    /// `round(birim_fiyat * adet, 2)`.
    pub fn line_total(&self) -> f64 {
        match &self.top_fiyat {
            Some(n) => n.resolve_or_zero(),
            None => round2(self.birim_fiyat.resolve_or_zero() * self.quantity() as f64),
        }
    }
}

/// The three summary values of a pricing table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferTotals {
    /// Gross subtotal
    pub toplam: f64,
    /// Discount amount
    pub iskonto: f64,
    /// Net total after discount
    pub net: f64,
}

impl OfferTotals {
    /// Compute totals from line items and a discount amount.
    pub fn from_items(items: &[LineItem], iskonto: f64) -> Self {
        let toplam = round2(items.iter().map(|i| i.line_total()).sum());
        Self {
            toplam,
            iskonto,
            net: round2(toplam - iskonto),
        }
    }
}

/// A price-offer record as stored by the back office.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub firma_adi: String,
    pub teklif_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub olcum_kodu: Option<String>,
    /// Offer date, used for the derived file name
    pub tarih: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baslangic_tarihi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitis_tarihi: Option<String>,
    #[serde(default)]
    pub baca_sayisi: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parametreler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub il: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ilce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yetkili: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durum: Option<String>,
    #[serde(default)]
    pub kalemler: Vec<LineItem>,
    #[serde(default)]
    pub toplamlar: OfferTotals,
}

impl Offer {
    /// Short firm name for file naming: first token of the firm name with
    /// everything but letters and digits removed, uppercased.
    pub fn firm_short_name(&self) -> String {
        let token = self.firma_adi.split_whitespace().next().unwrap_or("FIRMA");
        let cleaned: String = token.chars().filter(|c| c.is_alphanumeric()).collect();
        if cleaned.is_empty() {
            "FIRMA".to_string()
        } else {
            cleaned.to_uppercase()
        }
    }

    /// Derived output file name: `<firm>_<no>_<ddmmyy>_<net>TL.docx`.
    pub fn output_file_name(&self) -> String {
        let date = self.tarih.format("%d%m%y");
        // Offer numbers can contain separators that are unsafe in file names
        let no: String = self
            .teklif_no
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        format!(
            "{}_{}_{}_{:.2}TL.docx",
            self.firm_short_name(),
            no,
            date,
            self.toplamlar.net
        )
    }
}
