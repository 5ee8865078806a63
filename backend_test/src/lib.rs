use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one running against a
/// fresh in-memory store, and inject dependencies.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and
/// `crate::store::MemoryStore` (the same store the client's server uses).
///
/// `#[backend_test(seeded)]` registers an example user and three events owned
/// by them before the test starts.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract the injected arguments and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Seed the store if requested.
    let maybe_seed = match parse_macro_input!(args as Option<Ident>) {
        None => quote! {},
        Some(arg) if arg == "seeded" => quote! {
            use crate::model::db::{EventCore, UserCore};
            use crate::store::Store;

            let user = store.insert_user(UserCore::example()).await.unwrap();
            for event in [
                EventCore::example(user.id),
                EventCore::example2(user.id),
                EventCore::example3(user.id),
            ] {
                store.insert_event(event).await.unwrap();
            }
        },
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected `seeded` or nothing")
                .into_compile_error()
                .into();
        }
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup() -> (rocket::local::asynchronous::Client, crate::store::MemoryStore) {
                let store = crate::store::MemoryStore::new();

                #maybe_seed

                let storage = crate::store::Storage::new(store.clone());
                let rocket_client = rocket::local::asynchronous::Client::tracked(crate::rocket_for_store(storage))
                    .await
                    .unwrap();
                (rocket_client, store)
            }

            /// The test itself.
            #item_fn

            log4rs_test_utils::test_logging::init_logging_once_for(
                ["rising_stars_backend"],
                None,
                None,
            );

            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                #[allow(unused_variables)]
                let (rocket_client, store) = setup().await;
                #new_name(#(#test_args),*).await;
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, and extract parameters to inject.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                // Match on the last segment so qualified paths work too.
                if let Some(segment) = type_path.path.segments.last() {
                    if segment.ident == "Client" {
                        if has_client {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                            ));
                        }
                        has_client = true;
                        args.push(quote! { rocket_client });
                        continue;
                    } else if segment.ident == "MemoryStore" {
                        args.push(quote! { store.clone() });
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `store_ident: MemoryStore`",
        ));
    }

    Ok(args)
}
