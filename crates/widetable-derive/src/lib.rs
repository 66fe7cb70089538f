use proc_macro::TokenStream;

mod record;

/// Derive `Record`: a cached name → accessor table for the struct's fields.
///
/// Field attributes:
/// - `#[record(rename = "col")]` stores the field under another column name
/// - `#[record(skip)]` leaves the field out of the table
/// - `#[record(flatten)]` promotes an embedded record's columns
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input.into()).into()
}
