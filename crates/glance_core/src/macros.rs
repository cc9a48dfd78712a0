//! Registration boilerplate for adapter crates.

/// Generates the registration surface of an adapter crate.
///
/// Expands to a `descriptor()` function building the crate's
/// [`AdapterDescriptor`](crate::AdapterDescriptor) and a `register()` function
/// handing it to the process-wide registry. A compile-time check pins the
/// facade API version the adapter was written against.
///
/// `range` accepts a `VersionRange` or the `Result` of a checked range
/// constructor. The factory expression is evaluated only when the loader
/// binds this adapter.
///
/// ```ignore
/// glance_core::export_adapter! {
///     label: "paper-1.21",
///     range: VersionRange::half_open(VersionIdentifier::new(1, 21, 0), VersionIdentifier::new(1, 22, 0)),
///     api_version: 1,
///     factory: Engine::new,
/// }
/// ```
#[macro_export]
macro_rules! export_adapter {
    (
        label: $label:expr,
        range: $range:expr,
        api_version: $api:expr,
        factory: $factory:expr $(,)?
    ) => {
        const _: () = assert!(
            $api == $crate::FACADE_API_VERSION,
            "adapter was built against a different CapabilityFacade API version"
        );

        /// Descriptor for this adapter
        pub fn descriptor() -> ::std::result::Result<$crate::AdapterDescriptor, $crate::RegistryError> {
            let range = $crate::IntoVersionRange::into_range($range)?;
            Ok($crate::AdapterDescriptor::new($label, range, || {
                let facade = ($factory)()?;
                Ok(::std::boxed::Box::new(facade) as ::std::boxed::Box<dyn $crate::CapabilityFacade>)
            }))
        }

        /// Registers this adapter with the process-wide loader.
        pub fn register() -> ::std::result::Result<(), $crate::RegistryError> {
            $crate::global::register_adapter(descriptor()?)
        }
    };
}
