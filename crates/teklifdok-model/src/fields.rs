//! Field map construction: business record to placeholder values.
//!
//! Templates carry `{{KEY}}` / `{KEY}` tokens; the substitution engine
//! replaces them from the map built here. The vocabulary is defined by the
//! templates, not by the engine - unknown tokens are simply left in place,
//! so adding a key here is always safe.

use std::collections::BTreeMap;

use crate::offer::Offer;

/// Placeholder key to value mapping, built fresh per composition.
///
/// A `BTreeMap` keeps substitution deterministic across runs.
pub type FieldMap = BTreeMap<String, String>;

/// Build the placeholder map for an offer record.
pub fn build_field_map(offer: &Offer) -> FieldMap {
    let mut map = FieldMap::new();
    map.insert("FIRMA_ADI".into(), offer.firma_adi.clone());
    map.insert("TEKLIF_NO".into(), offer.teklif_no.clone());
    map.insert("TARIH".into(), offer.tarih.format("%d.%m.%Y").to_string());
    map.insert("BACA_SAYISI".into(), offer.baca_sayisi.to_string());

    let mut opt = |key: &str, value: &Option<String>| {
        if let Some(v) = value {
            map.insert(key.to_string(), v.clone());
        }
    };
    opt("OLCUM_KODU", &offer.olcum_kodu);
    opt("BASLANGIC_TARIHI", &offer.baslangic_tarihi);
    opt("BITIS_TARIHI", &offer.bitis_tarihi);
    opt("PARAMETRELER", &offer.parametreler);
    opt("PERSONEL", &offer.personel);
    opt("IL", &offer.il);
    opt("ILCE", &offer.ilce);
    opt("YETKILI", &offer.yetkili);
    opt("TELEFON", &offer.telefon);
    opt("DURUM", &offer.durum);

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::OfferTotals;
    use chrono::NaiveDate;

    fn sample_offer() -> Offer {
        Offer {
            firma_adi: "ACME A.Ş.".into(),
            teklif_no: "TKF-41".into(),
            olcum_kodu: Some("EM-2025-12".into()),
            tarih: NaiveDate::from_ymd_opt(2025, 8, 14).unwrap(),
            baslangic_tarihi: Some("18.08.2025".into()),
            bitis_tarihi: None,
            baca_sayisi: 3,
            parametreler: Some("TOZ, SO2".into()),
            personel: None,
            il: Some("KOCAELİ".into()),
            ilce: None,
            yetkili: None,
            telefon: None,
            durum: None,
            kalemler: vec![],
            toplamlar: OfferTotals::default(),
        }
    }

    #[test]
    fn test_build_field_map() {
        let map = build_field_map(&sample_offer());
        assert_eq!(map.get("FIRMA_ADI").map(String::as_str), Some("ACME A.Ş."));
        assert_eq!(map.get("TARIH").map(String::as_str), Some("14.08.2025"));
        assert_eq!(map.get("BACA_SAYISI").map(String::as_str), Some("3"));
        assert_eq!(map.get("OLCUM_KODU").map(String::as_str), Some("EM-2025-12"));
        // Absent optionals are not inserted at all
        assert!(!map.contains_key("BITIS_TARIHI"));
        assert!(!map.contains_key("PERSONEL"));
    }
}
