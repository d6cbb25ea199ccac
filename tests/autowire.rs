use lazydi::{
    autowire::{check, resolve, Factories},
    declare, environment, AutowireErrorKind, Registry, Scope,
};
use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

struct Events {
    id: u8,
}

struct Repository {
    events: Arc<Events>,
}

#[derive(Default)]
struct Env {
    events: Option<Arc<Events>>,
    repository: Option<Arc<Repository>>,
}

environment!(Env { events, repository });

fn factories(built: &Arc<AtomicU8>) -> Factories {
    let scope = Scope::new(Arc::new(Registry::new()));

    let events = declare("Events", {
        let built = built.clone();
        move |_: &Scope| {
            Ok(Events {
                id: built.fetch_add(1, Ordering::SeqCst),
            })
        }
    });
    let repository = declare("Repository", {
        let events = events.clone();
        move |scope: &Scope| Ok(Repository { events: events.get(scope)? })
    });

    Factories::new().component(&events, &scope).component(&repository, &scope)
}

#[test]
fn test_resolve() {
    let built = Arc::new(AtomicU8::new(0));
    let factories = factories(&built);
    let mut env = Env::default();

    resolve(&factories, &mut env).unwrap();
    check(&env).unwrap();

    let events = env.events.unwrap();
    let repository = env.repository.unwrap();
    assert!(Arc::ptr_eq(&events, &repository.events));
    assert_eq!(events.id, 0);
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn test_check_unset() {
    let mut env = Env::default();

    resolve(&Factories::new(), &mut env).unwrap();
    assert!(matches!(check(&env), Err(AutowireErrorKind::Unset { field: "events" })));

    env.events = Some(Arc::new(Events { id: 1 }));
    let err = check(&env).unwrap_err();

    assert_eq!(err.to_string(), "Field repository is unset");
}

#[test]
fn test_preset_fields_are_kept() {
    let preset = Arc::new(Events { id: 42 });
    let mut env = Env {
        events: Some(preset.clone()),
        repository: None,
    };

    resolve(&Factories::new().add(|| 8080u16), &mut env).unwrap();

    assert!(Arc::ptr_eq(env.events.as_ref().unwrap(), &preset));
    assert!(env.repository.is_none());
}
