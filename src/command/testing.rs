//! Scripted executor for unit tests
//!
//! Records every command and keeps a fake mount table so `findmnt` queries
//! answer according to the mount/unmount commands issued before them.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use super::{CommandExecutor, ShellCommand};
use crate::error::Result;
use crate::msd::MountBackend;

pub(crate) const FUSE_FSTYPE: &str = "fuse.fat32fuse";

#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    log: Mutex<Vec<ShellCommand>>,
    mounts: Mutex<HashMap<PathBuf, &'static str>>,
    failures: Mutex<Vec<(String, i32)>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any command whose rendered text starts with `prefix` exits with `code`
    pub fn fail_when(&self, prefix: &str, code: i32) {
        self.failures.lock().unwrap().push((prefix.to_string(), code));
    }

    pub fn set_mounted(&self, path: impl Into<PathBuf>, fstype: &'static str) {
        self.mounts.lock().unwrap().insert(path.into(), fstype);
    }

    pub fn is_mounted(&self, path: impl Into<PathBuf>) -> bool {
        self.mounts.lock().unwrap().contains_key(&path.into())
    }

    /// Commands as issued, with their raw arguments
    pub fn issued(&self) -> Vec<ShellCommand> {
        self.log.lock().unwrap().clone()
    }

    /// Rendered commands in issue order
    pub fn commands(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Rendered commands, minus the `findmnt` queries
    pub fn actions(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| !c.starts_with("findmnt"))
            .collect()
    }

    fn simulate(&self, command: &ShellCommand) -> i32 {
        let args = command.get_args();
        let mut mounts = self.mounts.lock().unwrap();
        match command.program().to_str() {
            Some("findmnt") => match args {
                [flag, fstype, path] if flag == "-t" => {
                    let current = mounts.get(&PathBuf::from(path)).map(OsStr::new);
                    if current == Some(fstype.as_os_str()) {
                        0
                    } else {
                        1
                    }
                }
                [path] => {
                    if mounts.contains_key(&PathBuf::from(path)) {
                        0
                    } else {
                        1
                    }
                }
                _ => 1,
            },
            Some("mount") => {
                // mount -t vfat <source> <target> -o <opts>
                if let Some(target) = args.get(3) {
                    mounts.insert(PathBuf::from(target), MountBackend::DIRECT_FSTYPE);
                }
                0
            }
            Some("umount") => match args.first() {
                Some(target) if mounts.remove(&PathBuf::from(target)).is_some() => 0,
                _ => 32,
            },
            Some("fallocate") => {
                if let Some(path) = args.last() {
                    File::create(path).expect("create fake backing file");
                }
                0
            }
            _ => match args {
                [flag, target] if flag == "-u" => {
                    if mounts.remove(&PathBuf::from(target)).is_some() {
                        0
                    } else {
                        1
                    }
                }
                [.., mount_flag, target, sub] if mount_flag == "--mount-path" && sub == "mount" => {
                    mounts.insert(PathBuf::from(target), FUSE_FSTYPE);
                    0
                }
                _ => 0,
            },
        }
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn execute(&self, command: &ShellCommand) -> Result<i32> {
        self.log.lock().unwrap().push(command.clone());

        let rendered = command.to_string();
        let injected = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| rendered.starts_with(prefix.as_str()))
            .map(|(_, code)| *code);
        if let Some(code) = injected {
            return Ok(code);
        }

        Ok(self.simulate(command))
    }
}
