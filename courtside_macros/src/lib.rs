use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    braced, parenthesized,
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
    Expr, FnArg, Ident, ItemFn, LitStr, Pat, Token,
};

// ============================================================================
// #[digest] attribute macro
// ============================================================================

/// Records the method call as an event on the aggregate's entity before the
/// body runs.
///
/// Every typed parameter is captured, in order, into a tuple payload. Replay
/// (see [`aggregate!`]) decodes the same tuple and calls the method again,
/// so the method body is the single place where state changes.
///
/// ```ignore
/// #[digest("PointsAdded", when = !self.completed)]
/// pub fn add_points(&mut self, side: Side, amount: u32) {
///     *self.points.get_mut(side) += amount;
/// }
/// ```
///
/// - `when = expr` wraps the whole body: if the guard is false nothing is
///   recorded and nothing changes. Guarded methods must return `()`.
/// - A leading identifier selects a different entity field:
///   `#[digest(journal, "Opened")]`. The default field is `entity`.
#[proc_macro_attribute]
pub fn digest(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as DigestArgs);
    let mut func = parse_macro_input!(item as ItemFn);

    let entity_field = &args.entity_field;
    let event_name = &args.event_name;
    let payload = payload_tuple(&param_idents(&func));

    let record = quote! {
        self.#entity_field.digest(#event_name, &#payload);
    };

    let body = &func.block.stmts;
    func.block = Box::new(match &args.guard {
        Some(guard) => syn::parse_quote! {{
            if #guard {
                #record
                #(#body)*
            }
        }},
        None => syn::parse_quote! {{
            #record
            #(#body)*
        }},
    });

    TokenStream::from(quote! { #func })
}

struct DigestArgs {
    entity_field: Ident,
    event_name: LitStr,
    guard: Option<Expr>,
}

impl Parse for DigestArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let entity_field = if input.peek(LitStr) {
            format_ident!("entity")
        } else {
            let field: Ident = input.parse()?;
            input.parse::<Token![,]>()?;
            field
        };
        let event_name: LitStr = input.parse()?;

        let mut guard = None;
        while input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let key: Ident = input.parse()?;
            if key != "when" {
                return Err(syn::Error::new(key.span(), "expected `when = <guard>`"));
            }
            input.parse::<Token![=]>()?;
            guard = Some(input.parse()?);
        }

        Ok(DigestArgs {
            entity_field,
            event_name,
            guard,
        })
    }
}

/// Names of the typed (non-receiver) parameters of a method.
fn param_idents(func: &ItemFn) -> Vec<Ident> {
    func.sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat_type) => match &*pat_type.pat {
                Pat::Ident(pat_ident) => Some(pat_ident.ident.clone()),
                _ => None,
            },
            FnArg::Receiver(_) => None,
        })
        .collect()
}

/// A tuple of references to the parameters; `()` when there are none.
fn payload_tuple(params: &[Ident]) -> TokenStream2 {
    match params {
        [] => quote! { () },
        [single] => quote! { (&#single,) },
        many => quote! { (#(&#many),*) },
    }
}

// ============================================================================
// aggregate! proc-macro
// ============================================================================

/// Implements `courtside::Aggregate` for a struct whose commands are
/// annotated with `#[digest]`.
///
/// ```ignore
/// courtside::aggregate!(MatchSet, entity {
///     "Opened"(match_id, number, rules, substitution_limit) => open,
///     "PointsAdded"(side, amount) => add_points,
///     "SubstitutionUsed"(side) => use_substitution,
/// });
/// ```
///
/// The argument list must match the recorded tuple (the method's parameters);
/// replay decodes it and calls the method with the decoded values.
#[proc_macro]
pub fn aggregate(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as AggregateInput);

    let agg_name = &input.agg_name;
    let entity_field = &input.entity_field;

    let replay_arms = input.events.iter().map(|evt| {
        let event_name = &evt.event_name;
        let method = &evt.method;
        match evt.args.as_slice() {
            [] => quote! {
                #event_name => self.#method(),
            },
            [single] => quote! {
                #event_name => {
                    let (#single,) = event.decode().map_err(|e| e.to_string())?;
                    self.#method(#single);
                }
            },
            many => quote! {
                #event_name => {
                    let (#(#many),*) = event.decode().map_err(|e| e.to_string())?;
                    self.#method(#(#many),*);
                }
            },
        }
    });

    let expanded = quote! {
        impl courtside::Aggregate for #agg_name {
            type ReplayError = String;

            fn entity(&self) -> &courtside::Entity {
                &self.#entity_field
            }

            fn entity_mut(&mut self) -> &mut courtside::Entity {
                &mut self.#entity_field
            }

            fn replay_event(
                &mut self,
                event: &courtside::EventRecord,
            ) -> Result<(), Self::ReplayError> {
                match event.event_name.as_str() {
                    #(#replay_arms)*
                    other => {
                        return Err(format!(
                            "unknown event {} for {}",
                            other,
                            stringify!(#agg_name)
                        ))
                    }
                }
                Ok(())
            }
        }
    };

    TokenStream::from(expanded)
}

struct AggregateInput {
    agg_name: Ident,
    entity_field: Ident,
    events: Vec<EventDef>,
}

struct EventDef {
    event_name: LitStr,
    args: Vec<Ident>,
    method: Ident,
}

impl Parse for AggregateInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let agg_name: Ident = input.parse()?;
        input.parse::<Token![,]>()?;
        let entity_field: Ident = input.parse()?;

        let content;
        braced!(content in input);

        let mut events = Vec::new();
        while !content.is_empty() {
            let event_name: LitStr = content.parse()?;

            let args_content;
            parenthesized!(args_content in content);
            let args: Punctuated<Ident, Token![,]> =
                args_content.parse_terminated(Ident::parse, Token![,])?;

            content.parse::<Token![=>]>()?;
            let method: Ident = content.parse()?;

            events.push(EventDef {
                event_name,
                args: args.into_iter().collect(),
                method,
            });

            if content.peek(Token![,]) {
                content.parse::<Token![,]>()?;
            }
        }

        Ok(AggregateInput {
            agg_name,
            entity_field,
            events,
        })
    }
}
