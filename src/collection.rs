use std::{borrow::Cow, sync::Arc};

use crate::{
    component::{declare, declare_with_options, Component},
    errors::BuildErrorKind,
    options::Options,
    scope::Scope,
};

/// Declares a component that resolves to every item of `items` wrapped with `wrap`, in input order.
///
/// Each wrapped item is a component of its own named `"<name>:<i>"`, counting from 1, with the given options,
/// so items are built once per registry and take part in init and done like any other component.
#[must_use]
pub fn collection<T, W, F>(name: impl Into<Cow<'static, str>>, items: Vec<Component<T>>, wrap: F, options: Options<W>) -> Component<Vec<Arc<W>>>
where
    T: Send + Sync + 'static,
    W: Send + Sync + 'static,
    F: Fn(&Scope, Arc<T>) -> Result<W, BuildErrorKind> + Send + Sync + 'static,
{
    let name = name.into();
    let wrap = Arc::new(wrap);

    let wrapped = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let wrap = wrap.clone();
            declare_with_options(
                format!("{name}:{}", index + 1),
                move |scope: &Scope| wrap(scope, item.get(scope)?),
                options.clone(),
            )
        })
        .collect::<Vec<_>>();

    declare(name, move |scope: &Scope| {
        wrapped.iter().map(|item| item.get(scope).map_err(BuildErrorKind::from)).collect()
    })
}
