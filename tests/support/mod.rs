//! Example models and factories shared by the integration tests.
//!
//! A small user-profile domain: a `UserInfo` aggregate holding a nested
//! `ProfileData`. The factories exercise faker draws, a sequence-backed
//! lazy attribute, instance attributes, nested factories, named states,
//! and a post-make hook.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use warhol::prelude::*;

/// Social-profile URLs attached to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileData {
	pub facebook_profile_url: Option<String>,
	pub twitter_profile_url: Option<String>,
	pub github_profile_url: Option<String>,
	pub personal_url: Option<String>,
}

impl FromAttributes for ProfileData {
	fn from_attributes(attrs: Attributes) -> FactoryResult<Self> {
		Ok(Self {
			facebook_profile_url: optional_url(&attrs, "facebook_profile_url")?,
			twitter_profile_url: optional_url(&attrs, "twitter_profile_url")?,
			github_profile_url: optional_url(&attrs, "github_profile_url")?,
			personal_url: optional_url(&attrs, "personal_url")?,
		})
	}
}

fn optional_url(attrs: &Attributes, key: &str) -> FactoryResult<Option<String>> {
	if attrs.contains(key) {
		attrs.string(key).map(Some)
	} else {
		Ok(None)
	}
}

/// A user aggregate with a nested profile.
#[derive(Debug, Clone, PartialEq)]
pub struct UserInfo {
	pub external_id: String,
	pub name: String,
	pub email: String,
	pub birthday: DateTime<Utc>,
	pub age: i64,
	pub profile: ProfileData,
}

impl FromAttributes for UserInfo {
	fn from_attributes(mut attrs: Attributes) -> FactoryResult<Self> {
		Ok(Self {
			external_id: attrs.string("external_id")?,
			name: attrs.string("name")?,
			email: attrs.string("email")?,
			birthday: attrs.take_object("birthday")?,
			age: attrs.int("age")?,
			profile: attrs.take_object("profile")?,
		})
	}
}

impl HasFactory for UserInfo {
	type Factory = UserInfoFactory;
}

impl HasFactory for ProfileData {
	type Factory = ProfileDataFactory;
}

/// Factory for [`ProfileData`], whole-map construction.
#[derive(Default)]
pub struct ProfileDataFactory;

impl Factory for ProfileDataFactory {
	type Target = ProfileData;

	fn definition(&self, faker: &Faker) -> Attributes {
		attrs! {
			"facebook_profile_url" => format!("https://facebook.com/{}", faker.username()),
			"twitter_profile_url" => format!("https://x.com/{}", faker.username()),
			"github_profile_url" => format!("https://github.com/{}", faker.username()),
			"personal_url" => format!("https://{}.example.com/", faker.word()),
		}
	}

	fn construction(&self) -> Construction<ProfileData> {
		Construction::from_map()
	}
}

/// Named states for profile builders.
pub trait ProfileDataStates: Sized {
	/// Points the social URLs at handles derived from `name`.
	fn with_profile_for(&self, name: &str) -> Self;
}

impl ProfileDataStates for Builder<ProfileDataFactory> {
	fn with_profile_for(&self, name: &str) -> Self {
		let handle = slug(name);
		self.state(attrs! {
			"twitter_profile_url" => format!("https://x.com/{handle}"),
			"github_profile_url" => format!("https://github.com/{handle}"),
			"personal_url" => format!("https://{handle}.com/"),
		})
	}
}

/// Factory for [`UserInfo`].
///
/// Configuration adds a hook that re-points the profile URLs at the made
/// user's name, so the nested profile always matches its owner.
#[derive(Default)]
pub struct UserInfoFactory;

impl Factory for UserInfoFactory {
	type Target = UserInfo;

	fn definition(&self, faker: &Faker) -> Attributes {
		attrs! {
			"external_id" => AttrValue::lazy(|_| {
				AttrValue::from(sequence("user.external_id", "EXT-{n}"))
			}),
			"name" => faker.name(),
			"email" => faker.email(),
			"birthday" => AttrValue::object(faker.past_datetime(30 * 365)),
			"age" => faker.number_between(21, 40),
			"profile" => ProfileDataFactory::new(),
		}
	}

	fn construction(&self) -> Construction<UserInfo> {
		Construction::from_map()
	}

	fn configure(builder: Builder<Self>) -> Builder<Self> {
		builder.after_making(|user| {
			let handle = slug(&user.name);
			user.profile.twitter_profile_url = Some(format!("https://x.com/{handle}"));
			user.profile.github_profile_url = Some(format!("https://github.com/{handle}"));
			user.profile.personal_url = Some(format!("https://{handle}.com/"));
		})
	}
}

/// Named states for user builders.
pub trait UserInfoStates: Sized {
	/// Ages the user into the 21-40 bracket with a matching birthday.
	fn unrestricted_age(&self) -> Self;

	/// Ages the user into the 0-12 bracket with a matching birthday.
	fn restricted_age(&self) -> Self;
}

impl UserInfoStates for Builder<UserInfoFactory> {
	fn unrestricted_age(&self) -> Self {
		let faker = self.faker().clone();
		self.state_with(move |_| {
			let birthday = faker.past_datetime(19 * 365) - Duration::days(21 * 365);
			Attributes::new()
				.with("birthday", AttrValue::object(birthday))
				.with("age", years_since(birthday))
		})
	}

	fn restricted_age(&self) -> Self {
		let faker = self.faker().clone();
		self.state_with(move |_| {
			let birthday = faker.past_datetime(12 * 365);
			Attributes::new()
				.with("birthday", AttrValue::object(birthday))
				.with("age", years_since(birthday))
		})
	}
}

/// Whole years elapsed since `moment`.
pub fn years_since(moment: DateTime<Utc>) -> i64 {
	(Utc::now() - moment).num_days() / 365
}

/// Lowercase hyphenated handle derived from a display name.
pub fn slug(name: &str) -> String {
	name.split_whitespace()
		.map(|word| {
			word.chars()
				.filter(|c| c.is_ascii_alphanumeric())
				.collect::<String>()
				.to_lowercase()
		})
		.filter(|word| !word.is_empty())
		.collect::<Vec<_>>()
		.join("-")
}

/// Clears the registry and registers both support factories.
pub fn register_support_factories() {
	clear_factories();
	register::<UserInfoFactory>();
	register::<ProfileDataFactory>();
}
