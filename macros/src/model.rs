use darling::{ast, util::Flag, FromDeriveInput, FromField};
use proc_macro2::{TokenStream, TokenTree};
use quote::{format_ident, quote, ToTokens};
use syn::{punctuated::Punctuated, Attribute, Meta, Token};

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelInputReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelFieldReceiver>,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(attributes(model), forward_attrs)]
struct ModelFieldReceiver {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,

	read_only: Flag,
	alias: Option<String>,
	input: Option<syn::Type>,
}

enum InputField<'a> {
	Writable {
		attrs: Vec<&'a Attribute>,
		ident: &'a syn::Ident,
		ty: &'a syn::Type,
		vis: &'a syn::Visibility,
		verbatim: bool,
	},
	ReadOnly {
		ident: &'a syn::Ident,
		vis: &'a syn::Visibility,
		alias: Option<&'a str>,
	},
}

/// Attributes that belong to the database row and never to a payload.
fn is_row_attr(attr: &Attribute) -> bool {
	attr.path().is_ident("sqlx") || attr.path().is_ident("model")
}

fn has_serde_flag(attrs: &[Attribute], flags: &[&str]) -> bool {
	attrs.iter().any(|attr| {
		let Meta::List(ref list) = attr.meta else {
			return false;
		};

		if !list.path.is_ident("serde") {
			return false;
		}

		list.tokens.to_token_stream().into_iter().any(|token| {
			matches!(token, TokenTree::Ident(ref ident) if flags.iter().any(|flag| ident == flag))
		})
	})
}

/// Struct-level attributes for the generated inputs, with `FromRow` removed from derives.
fn input_attrs(attrs: &[Attribute]) -> Vec<TokenStream> {
	attrs
		.iter()
		.filter(|attr| !is_row_attr(attr))
		.map(|attr| {
			if !attr.path().is_ident("derive") {
				return attr.to_token_stream();
			}

			let Ok(paths) =
				attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
			else {
				return attr.to_token_stream();
			};

			let paths = paths.into_iter().filter(|path| {
				path.segments
					.last()
					.map_or(true, |segment| segment.ident != "FromRow")
			});

			quote!(#[derive(#(#paths),*)])
		})
		.collect()
}

pub fn from_input(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let mut input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelInputReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	// `model` is not a registered helper attribute, so it has to go before the
	// struct is emitted again.
	if let syn::Data::Struct(ref mut data) = input.data {
		for field in &mut data.fields {
			field.attrs.retain(|attr| !attr.path().is_ident("model"));
		}
	}

	let ident = &receiver.ident;
	let vis = &input.vis;
	let (impl_generics, ty_generics, where_clause) = receiver.generics.split_for_impl();
	let generics = &receiver.generics;
	let create_ident = format_ident!("Create{}Input", ident);
	let update_ident = format_ident!("Update{}Input", ident);

	let attrs = input_attrs(&receiver.attrs);

	let Some(fields) = receiver.data.take_struct() else {
		return syn::Error::new_spanned(&input.ident, "expected a struct with named fields")
			.into_compile_error()
			.into();
	};

	let fields = fields
		.iter()
		.filter_map(|field| {
			let ident = field.ident.as_ref()?;
			let vis = &field.vis;

			if field.read_only.is_present() {
				return Some(InputField::ReadOnly {
					ident,
					vis,
					alias: field.alias.as_deref(),
				});
			}

			if has_serde_flag(&field.attrs, &["skip_deserializing", "skip"]) {
				return None;
			}

			let attrs = field.attrs.iter().filter(|attr| !is_row_attr(attr)).collect();

			Some(match field.input {
				Some(ref ty) => InputField::Writable {
					attrs,
					ident,
					ty,
					vis,
					verbatim: true,
				},
				None => InputField::Writable {
					attrs,
					ident,
					ty: &field.ty,
					vis,
					verbatim: false,
				},
			})
		})
		.collect::<Vec<_>>();

	// `Option` alone would read an explicit `null` as absent, so any value counts as present.
	let present = format!("{ident}::read_only_present");

	let input_fields = |optional: bool| {
		let present = &present;
		fields
			.iter()
			.map(move |field| match field {
				InputField::Writable {
					attrs,
					ident,
					ty,
					vis,
					verbatim,
				} => {
					if optional && !verbatim {
						quote! {
							#(#attrs)*
							#vis #ident: Option<#ty>,
						}
					} else {
						quote! {
							#(#attrs)*
							#vis #ident: #ty,
						}
					}
				}
				InputField::ReadOnly { ident, vis, alias } => {
					let alias = alias.map(|alias| quote!(, alias = #alias));

					quote! {
						#[serde(default, skip_serializing, deserialize_with = #present #alias)]
						#[schemars(skip)]
						#vis #ident: Option<::serde::de::IgnoredAny>,
					}
				}
			})
			.collect::<Vec<_>>()
	};

	let create_fields = input_fields(false);
	let update_fields = input_fields(true);

	let read_only = fields
		.iter()
		.filter_map(|field| match field {
			InputField::ReadOnly { ident, .. } => Some(*ident),
			InputField::Writable { .. } => None,
		})
		.collect::<Vec<_>>();
	let read_only_names = read_only.iter().map(|ident| ident.to_string());

	let reject_read_only = quote! {
		/// Returns a validation error for every server-assigned field present in the payload.
		#[allow(unused_mut)]
		pub fn reject_read_only(&self) -> Result<(), ::validator::ValidationErrors> {
			let mut errors = ::validator::ValidationErrors::new();

			#(
				if self.#read_only.is_some() {
					errors.add(#read_only_names, ::validator::ValidationError::new("read_only"));
				}
			)*

			if errors.errors().is_empty() {
				Ok(())
			} else {
				Err(errors)
			}
		}
	};

	let present_fn = (!read_only.is_empty()).then(|| {
		quote! {
			impl #impl_generics #ident #ty_generics #where_clause {
				#[doc(hidden)]
				fn read_only_present<'de, D>(
					deserializer: D,
				) -> Result<Option<::serde::de::IgnoredAny>, D::Error>
				where
					D: ::serde::Deserializer<'de>,
				{
					<::serde::de::IgnoredAny as ::serde::Deserialize>::deserialize(deserializer).map(Some)
				}
			}
		}
	});

	quote! {
		#input

		#present_fn

		#(#attrs)*
		#vis struct #create_ident #generics {
			#(
				#create_fields
			)*
		}

		impl #impl_generics #create_ident #ty_generics #where_clause {
			#reject_read_only
		}

		#(#attrs)*
		#vis struct #update_ident #generics {
			#(
				#update_fields
			)*
		}

		impl #impl_generics #update_ident #ty_generics #where_clause {
			#reject_read_only
		}
	}
	.into()
}
