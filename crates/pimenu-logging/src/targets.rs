/// Privileged and network actions issued from the menu (reboot, link changes).
pub const T_ACTIONS: &str = "pimenu::actions";
