//! Mass-storage gadget driver control
//!
//! The gadget is the legacy `g_mass_storage` kernel module: loading it with a
//! `file=` parameter exposes the backing file to the upstream USB host,
//! unloading it takes the file away again. Driver state is never queried;
//! a second load or unload fails however the module loader decides.

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::command::{CommandExecutor, ShellCommand};
use crate::config::GadgetConfig;
use crate::error::Result;
use crate::msd::{BackingFileProvisioner, Provisioned};

/// Loads and unloads the mass-storage gadget driver
#[derive(Clone)]
pub struct GadgetController {
    executor: Arc<dyn CommandExecutor>,
    provisioner: BackingFileProvisioner,
    /// Kernel module name
    module: String,
    /// Extra module parameters
    params: Vec<String>,
}

impl GadgetController {
    pub fn new(
        config: &GadgetConfig,
        executor: Arc<dyn CommandExecutor>,
        provisioner: BackingFileProvisioner,
    ) -> Self {
        Self {
            executor,
            provisioner,
            module: config.driver_module.clone(),
            params: config.driver_params.clone(),
        }
    }

    /// Provision the backing file if needed, then load the driver with it
    pub fn enable(&self, backing_file: &Path, size_gb: u32) -> Result<Provisioned> {
        let provisioned = self.provisioner.ensure(backing_file, size_gb)?;

        info!(
            "Enabling {} gadget with {}",
            self.module,
            backing_file.display()
        );
        let mut file_param = OsString::from("file=\"");
        file_param.push(backing_file.as_os_str());
        file_param.push("\"");
        let cmd = ShellCommand::new("modprobe")
            .arg(self.module.as_str())
            .arg(file_param)
            .args(&self.params);
        self.executor.run(&cmd)?;
        Ok(provisioned)
    }

    /// Unload the driver
    pub fn disable(&self) -> Result<()> {
        info!("Disabling {} gadget", self.module);
        let cmd = ShellCommand::new("modprobe")
            .arg("-r")
            .arg(self.module.as_str());
        self.executor.run(&cmd)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::ScriptedExecutor;
    use crate::error::AppError;
    use crate::msd::MountManager;
    use std::ffi::OsStr;
    use std::fs;
    use std::os::unix::ffi::OsStrExt;
    use tempfile::TempDir;

    fn controller(config: &GadgetConfig, executor: &Arc<ScriptedExecutor>) -> GadgetController {
        let mounts = MountManager::new(config, executor.clone());
        let provisioner = BackingFileProvisioner::new(config, executor.clone(), mounts);
        GadgetController::new(config, executor.clone(), provisioner)
    }

    #[test]
    fn test_enable_existing_file_only_loads_driver() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("img.bin");
        fs::write(&image, b"").unwrap();
        let executor = Arc::new(ScriptedExecutor::new());

        let outcome = controller(&GadgetConfig::default(), &executor)
            .enable(&image, 64)
            .unwrap();

        assert_eq!(outcome, Provisioned::AlreadyPresent);
        assert_eq!(
            executor.commands(),
            vec![format!("modprobe g_mass_storage file=\"{}\"", image.display())]
        );
    }

    #[test]
    fn test_enable_appends_driver_params() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("img.bin");
        fs::write(&image, b"").unwrap();
        let executor = Arc::new(ScriptedExecutor::new());
        let config = GadgetConfig {
            driver_params: vec!["removable=1".to_string(), "stall=0".to_string()],
            ..GadgetConfig::default()
        };

        controller(&config, &executor).enable(&image, 64).unwrap();

        assert_eq!(
            executor.commands(),
            vec![format!(
                "modprobe g_mass_storage file=\"{}\" removable=1 stall=0",
                image.display()
            )]
        );
    }

    #[test]
    fn test_enable_skips_driver_when_provisioning_fails() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("img.bin");
        let executor = Arc::new(ScriptedExecutor::new());
        let config = GadgetConfig {
            scratch_mount_path: dir.path().join("scratch"),
            ..GadgetConfig::default()
        };
        executor.fail_when("mkfs.vfat", 1);

        assert!(controller(&config, &executor).enable(&image, 4).is_err());
        assert!(!executor.commands().iter().any(|c| c.starts_with("modprobe")));
        assert!(!image.exists());
    }

    #[test]
    fn test_driver_load_failure() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("img.bin");
        fs::write(&image, b"").unwrap();
        let executor = Arc::new(ScriptedExecutor::new());
        executor.fail_when("modprobe g_mass_storage", 1);

        let err = controller(&GadgetConfig::default(), &executor)
            .enable(&image, 64)
            .unwrap_err();

        assert!(matches!(err, AppError::CommandFailed { exit_code: 1, .. }));
    }

    #[test]
    fn test_enable_passes_raw_path_bytes() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join(OsStr::from_bytes(b"img\xff.bin"));
        fs::write(&image, b"").unwrap();
        let executor = Arc::new(ScriptedExecutor::new());

        controller(&GadgetConfig::default(), &executor).enable(&image, 64).unwrap();

        let issued = executor.issued();
        let mut expected = b"file=\"".to_vec();
        expected.extend_from_slice(image.as_os_str().as_bytes());
        expected.push(b'"');
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].get_args()[1].as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_disable_unloads_driver() {
        let executor = Arc::new(ScriptedExecutor::new());

        controller(&GadgetConfig::default(), &executor).disable().unwrap();

        assert_eq!(executor.commands(), vec!["modprobe -r g_mass_storage"]);
    }

    #[test]
    fn test_disable_failure() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.fail_when("modprobe -r", 1);

        let err = controller(&GadgetConfig::default(), &executor).disable().unwrap_err();

        assert!(matches!(err, AppError::CommandFailed { exit_code: 1, .. }));
    }
}
