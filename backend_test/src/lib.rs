use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one and inject dependencies.
///
/// Every test gets a fresh election backed by an in-memory store and seeded
/// with the demo slate and roster. Injectable dependencies are
/// [`rocket::local::asynchronous::Client`] and
/// [`crate::model::store::MemoryStore`] (a handle on the backing store).
///
/// The optional argument logs the client in first: `admin` and
/// `verifikator` use the default operator accounts, `voter` signs in by
/// token as the verified demo voter Budi Santoso.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract type information and reject invalid function signatures.
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

    // Log in the client as an operator or a voter if needed.
    let maybe_login = match parse_macro_input!(args as Option<Ident>) {
        Some(arg) if arg == "admin" || arg == "verifikator" => {
            let username = arg.to_string();
            let password = if arg == "admin" { "admin123" } else { "verif123" };
            quote! {
                {
                    let response = rocket_client
                        .post("/auth/login")
                        .header(rocket::http::ContentType::JSON)
                        .body(rocket::serde::json::json!({
                            "username": #username,
                            "password": #password,
                        }).to_string())
                        .dispatch()
                        .await;
                    assert_eq!(rocket::http::Status::Ok, response.status());
                }
            }
        }
        Some(arg) if arg == "voter" => quote! {
            {
                let response = rocket_client
                    .post("/auth/token")
                    .header(rocket::http::ContentType::Plain)
                    .body(crate::model::seed::BUDI_TOKEN)
                    .dispatch()
                    .await;
                assert_eq!(rocket::http::Status::Ok, response.status());
            }
        },
        Some(arg) => {
            return syn::Error::new(
                arg.span(),
                "Expected one of `admin`, `verifikator` or `voter`",
            )
            .into_compile_error()
            .into();
        }
        None => quote! {},
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup() -> (rocket::local::asynchronous::Client, crate::model::store::MemoryStore) {
                let store = crate::model::store::MemoryStore::default();
                let election = crate::model::election::Election::open(
                    Box::new(store.clone()),
                    crate::model::identity::Operators::default(),
                )
                .unwrap();
                election.seed_demo().unwrap();

                let rocket_client = rocket::local::asynchronous::Client::tracked(crate::rocket_for_election(election))
                    .await
                    .unwrap();

                #maybe_login

                (rocket_client, store)
            }

            /// The test itself.
            #item_fn

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

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_store = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    // Valid as the last path segment for any type is itself
                    let type_ident = &type_path.path.segments.last().unwrap().ident;
                    if type_ident == "Client" {
                        if has_client {
                            return Err(syn::Error::new(input.span(), "Test cannot accept more than one `rocket::local::asynchronous::Client`"));
                        }
                        has_client = true;
                        args.push(quote! { rocket_client });
                        continue;
                    } else if type_ident == "MemoryStore" {
                        if has_store {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `MemoryStore`",
                            ));
                        }
                        has_store = true;
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
