//! Tick-by-tick scenarios driven through the reference [`World`](crate::ecs::World) host
