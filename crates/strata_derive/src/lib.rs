mod event;
mod record;

use event::DeriveEvent;
use record::DeriveRecord;

/// Implements `Record`, `Encode` and `Decode` for a struct with named fields.
#[proc_macro_derive(Record)]
pub fn record(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    syn::parse_macro_input!(input as DeriveRecord)
        .expand()
        .into()
}

/// Implements `EventType`, tagging the event with the struct name or
/// `#[event(name = "...")]`.
#[proc_macro_derive(Event, attributes(event))]
pub fn event(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    syn::parse_macro_input!(input as DeriveEvent)
        .expand()
        .into()
}
