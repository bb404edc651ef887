//! State composition, expansion, and hook ordering.

mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rstest::rstest;
use warhol::prelude::*;

use support::{ProfileData, UserInfo, UserInfoFactory, UserInfoStates, slug};

#[rstest]
fn test_branching_builders_stay_independent() {
	let base = UserInfoFactory::new_with(attrs! { "name" => "Shared Base" });
	let restricted = base.restricted_age();
	let unrestricted = base.unrestricted_age();

	let minor = restricted.make_one().unwrap();
	let adult = unrestricted.make_one().unwrap();
	assert!((0..=12).contains(&minor.age));
	assert!((21..=40).contains(&adult.age));

	// The shared prefix never picked up either branch's layer.
	assert_eq!(base.layer_count(), 1);
	let from_base = base.make_one().unwrap();
	assert_eq!(from_base.name, "Shared Base");
}

#[rstest]
fn test_later_layers_win_on_conflict() {
	let profile = ProfileData::factory()
		.state(attrs! { "personal_url" => "https://first.test/" })
		.state(attrs! { "personal_url" => "https://second.test/" })
		.make_one()
		.unwrap();
	assert_eq!(profile.personal_url.as_deref(), Some("https://second.test/"));
}

#[rstest]
fn test_layer_reads_accumulated_values() {
	let profile = ProfileData::factory()
		.state(attrs! { "github_profile_url" => "https://github.com/warhol" })
		.try_state_with(|acc| {
			let mirror = format!("{}.mirror.test", acc.str("github_profile_url")?);
			Ok(Attributes::new().with("personal_url", mirror))
		})
		.make_one()
		.unwrap();
	assert_eq!(
		profile.personal_url.as_deref(),
		Some("https://github.com/warhol.mirror.test")
	);
}

#[rstest]
fn test_generator_sees_resolved_siblings() {
	let user = UserInfoFactory::new()
		.state(attrs! { "name" => "Grace Hopper" })
		.state(attrs! {
			"email" => AttrValue::try_lazy(|attrs| {
				Ok(AttrValue::from(format!("{}@navy.test", slug(attrs.str("name")?))))
			}),
		})
		.make_one()
		.unwrap();
	assert_eq!(user.email, "grace-hopper@navy.test");
}

#[rstest]
fn test_hooks_run_in_registration_order() {
	// The configure hook (registered first) derives the profile URLs; a
	// hook added afterwards observes its output.
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&seen);

	let user = UserInfoFactory::new_with(attrs! { "name" => "Andy Warhol" })
		.after_making(move |user| {
			sink.lock().push(user.profile.github_profile_url.clone());
		})
		.make_one()
		.unwrap();

	assert_eq!(
		*seen.lock(),
		vec![Some("https://github.com/andy-warhol".to_string())]
	);
	assert_eq!(
		user.profile.personal_url.as_deref(),
		Some("https://andy-warhol.com/")
	);
}

#[rstest]
fn test_batch_constructs_all_before_first_hook() {
	static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

	#[derive(Debug)]
	struct Tick;

	#[derive(Default)]
	struct TickFactory;

	impl Factory for TickFactory {
		type Target = Tick;

		fn definition(&self, _faker: &Faker) -> Attributes {
			Attributes::new()
		}

		fn construction(&self) -> Construction<Tick> {
			Construction::from_fn(|_| {
				CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
				Ok(Tick)
			})
		}
	}

	let made = TickFactory::new()
		.count(4)
		.after_making(|_| {
			assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 4);
		})
		.make()
		.unwrap();
	assert_eq!(made.len(), 4);
}

#[rstest]
fn test_seeded_fakers_reproduce_definitions() {
	let first = UserInfoFactory::new()
		.with_faker(Faker::seeded(404))
		.make_one()
		.unwrap();
	let second = UserInfoFactory::new()
		.with_faker(Faker::seeded(404))
		.make_one()
		.unwrap();

	assert_eq!(first.name, second.name);
	assert_eq!(first.email, second.email);
	assert_eq!(first.age, second.age);
	// Sequence-backed ids stay process-unique even under equal seeds.
	assert_ne!(first.external_id, second.external_id);
}

#[rstest]
fn test_count_zero_yields_empty_batch() {
	let made = UserInfo::factory().count(0).make().unwrap();
	assert!(matches!(made, Made::Batch(ref batch) if batch.is_empty()));
	assert_eq!(made.len(), 0);
}

#[rstest]
fn test_attributes_previews_expanded_map() {
	let attrs = UserInfoFactory::new()
		.state(attrs! { "name" => "Preview Only" })
		.attributes()
		.unwrap();

	// Definition order is preserved and special slots are resolved.
	let keys: Vec<_> = attrs.keys().cloned().collect();
	assert_eq!(
		keys,
		vec!["external_id", "name", "email", "birthday", "age", "profile"]
	);
	assert!(attrs.str("external_id").unwrap().starts_with("EXT-"));
	assert_eq!(attrs.str("name").unwrap(), "Preview Only");
	assert!(attrs.object_ref::<ProfileData>("profile").is_ok());
}

#[rstest]
fn test_failing_layer_reports_index_and_source() {
	let err = UserInfoFactory::new()
		.state(attrs! { "age" => 30 })
		.try_state_with(|_| Err(FactoryError::message("age must stay fake")))
		.make()
		.unwrap_err();

	match err {
		FactoryError::LayerEvaluation { index, source } => {
			assert_eq!(index, 1);
			assert!(source.to_string().contains("age must stay fake"));
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[rstest]
fn test_wrong_override_type_fails_construction() {
	let err = UserInfo::factory()
		.state(attrs! { "age" => "not a number" })
		.make()
		.unwrap_err();

	match err {
		FactoryError::Construction { target, reason } => {
			assert!(target.ends_with("UserInfo"));
			assert!(reason.contains("age"));
		}
		other => panic!("unexpected error: {other}"),
	}
}
