#[cfg(feature = "slack")]
pub mod slack;

#[cfg(feature = "kubernetes")]
pub mod kubernetes;

#[cfg(feature = "sparkpost")]
pub mod sparkpost;
