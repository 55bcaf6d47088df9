mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a new documentation function for the route, named after the original function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the operation summary, the remaining
/// lines become the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates two new structs: `CreateXInput` and `UpdateXInput` for the model.
///
/// Fields with `#[serde(skip_deserializing)]` or `#[serde(skip)]` are left out, and all
/// other fields are included verbatim (including attributes). In `UpdateXInput` every
/// field is wrapped in an `Option`.
///
/// Field options, given as `#[model(...)]`:
/// - `read_only`: the field is assigned by the server. The inputs accept it only so that
///   `reject_read_only` can report it as a validation error.
/// - `alias = "name"`: an extra payload name for a `read_only` field.
/// - `input = "Type"`: the type used for the field in both inputs, taken verbatim.
///
/// `sqlx` attributes and a derived `FromRow` are not carried over to the inputs.
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}
