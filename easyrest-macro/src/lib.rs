// Procedural macros for easyrest

use proc_macro::TokenStream;

mod record;

/// Derives `Record`, letting handlers take the struct as a form-bound
/// parameter or return it as JSON.
///
/// Public fields of type `String`, `bool`, a primitive integer or float, or
/// an `Option` of one of those are assignable from form values under their
/// own name. Other fields are left at their default.
///
/// Field attributes:
/// - `#[record(skip)]`: never assign from the form
/// - `#[record(rename = "Name")]`: use a different form key
/// - `#[record(form)]`: assign even if private or of another type
///   implementing `FormValue`
///
/// Container attribute `#[record(crate = "path")]` sets the path the
/// generated code uses for the runtime crate (default `::easyrest`).
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record_impl(input)
}
