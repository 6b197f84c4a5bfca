//! Build a document by hand, write it out, and read it back.
//!
//! Run with: `cargo run --example currencies`
#![allow(clippy::expect_used)]

use xmlarbor::serial::serialize;
use xmlarbor::{Document, NodeId};

/// `(id, name, short form, [(target, rate)])`
const CURRENCIES: &[(&str, &str, &str, [(&str, &str); 3])] = &[
    ("ccy1", "Swiss Franc", "CHF", [("USD", "1.10"), ("EUR", "0.83"), ("GBP", "0.69")]),
    ("ccy2", "Euro", "EUR (€)", [("USD", "1.33"), ("EUR", "1.00"), ("GBP", "0.84")]),
    ("ccy3", "US Dollar", "USD ($)", [("USD", "1.00"), ("EUR", "0.75"), ("GBP", "0.63")]),
    ("ccy4", "British Pound", "GBP (£)", [("USD", "1.59"), ("EUR", "1.19"), ("GBP", "1.00")]),
];

fn text_element(doc: &mut Document, name: &str, text: &str) -> NodeId {
    let element = doc.create_element(name).expect("valid name");
    let text = doc.create_text(text);
    doc.append_child(element, text).expect("element parent");
    element
}

fn main() {
    let mut doc = Document::new();
    let root = doc.create_element("currencies").expect("valid name");
    doc.set_root_element(root).expect("root is an element");

    for (id, name, short, rates) in CURRENCIES {
        let currency = doc
            .create_element_with("currency", Some(*id), std::iter::empty::<(&str, &str)>())
            .expect("valid name");
        doc.append_child(root, currency).expect("element parent");

        let name = text_element(&mut doc, "name", name);
        doc.append_child(currency, name).expect("element parent");
        let short = text_element(&mut doc, "shortForm", short);
        doc.append_child(currency, short).expect("element parent");

        let conversion = doc
            .create_element_with("conversion", None, rates.iter().copied())
            .expect("valid name");
        doc.append_child(currency, conversion).expect("element parent");
    }

    let xml = serialize(&doc);
    println!("{xml}\n");

    let copy = Document::parse_str(&xml).expect("canonical output parses");
    assert_eq!(copy, doc, "read-back document differs");

    let root = copy.root_element().expect("no root element");
    let euro = copy.element_by_id(root, "ccy2").expect("euro is present");
    let to_usd = copy
        .element_by_name(euro, "conversion")
        .expect("euro has conversions");
    let rate: f64 = copy.attribute_as(to_usd, "USD").expect("numeric rate");
    println!(
        "1 {} = {rate} USD",
        copy.element_by_name(euro, "shortForm")
            .and_then(|s| copy.text(s))
            .unwrap_or_default()
    );

    let names: Vec<String> = copy
        .elements_by_name(root, "currency")
        .iter()
        .filter_map(|&c| copy.element_by_name(c, "name"))
        .filter_map(|n| copy.text(n))
        .collect();
    println!("All currencies: {}", names.join(", "));
}
