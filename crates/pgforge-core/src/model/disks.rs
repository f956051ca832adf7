//! Disk performance model.
//!
//! A fixed, monotonic ladder of disk classes maps qualitative tags to
//! `(random IOPS, sequential throughput)` points. Conversion between the two
//! assumes one 8 KiB database page per random IO, so
//! `throughput MiB/s = iops / 128`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TuneError;
use crate::units::{DB_PAGE_SIZE, MI, generalized_mean};

/// Qualitative disk class, ordered from slowest to fastest. Both the IOPS and
/// the throughput columns are strictly increasing along the ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskGrade {
    /// 5.4k rpm laptop-class spindle.
    Hdd1,
    /// 7.2k rpm enterprise spindle.
    Hdd2,
    /// 10k rpm SAS spindle.
    Hdd3,
    /// Entry SATA SSD.
    SataSsd1,
    /// Performance SATA SSD.
    SataSsd2,
    /// SAS 12G SSD.
    SasSsd1,
    /// SAS 24G SSD.
    SasSsd2,
    NvmePcie3,
    NvmePcie4,
    NvmePcie5,
}

impl DiskGrade {
    pub const ALL: [DiskGrade; 10] = [
        DiskGrade::Hdd1,
        DiskGrade::Hdd2,
        DiskGrade::Hdd3,
        DiskGrade::SataSsd1,
        DiskGrade::SataSsd2,
        DiskGrade::SasSsd1,
        DiskGrade::SasSsd2,
        DiskGrade::NvmePcie3,
        DiskGrade::NvmePcie4,
        DiskGrade::NvmePcie5,
    ];

    /// Sustained random IOPS at 8 KiB pages.
    pub fn random_iops(self) -> u64 {
        match self {
            DiskGrade::Hdd1 => 100,
            DiskGrade::Hdd2 => 200,
            DiskGrade::Hdd3 => 400,
            DiskGrade::SataSsd1 => 40_000,
            DiskGrade::SataSsd2 => 65_000,
            DiskGrade::SasSsd1 => 120_000,
            DiskGrade::SasSsd2 => 200_000,
            DiskGrade::NvmePcie3 => 300_000,
            DiskGrade::NvmePcie4 => 500_000,
            DiskGrade::NvmePcie5 => 1_000_000,
        }
    }

    /// Sequential throughput in MiB/s.
    pub fn throughput_mib(self) -> u64 {
        match self {
            DiskGrade::Hdd1 => 100,
            DiskGrade::Hdd2 => 160,
            DiskGrade::Hdd3 => 240,
            DiskGrade::SataSsd1 => 350,
            DiskGrade::SataSsd2 => 530,
            DiskGrade::SasSsd1 => 1_100,
            DiskGrade::SasSsd2 => 2_100,
            DiskGrade::NvmePcie3 => 3_200,
            DiskGrade::NvmePcie4 => 6_500,
            DiskGrade::NvmePcie5 => 12_000,
        }
    }

    pub fn is_spinning(self) -> bool {
        matches!(self, DiskGrade::Hdd1 | DiskGrade::Hdd2 | DiskGrade::Hdd3)
    }
}

impl FromStr for DiskGrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Tags arrive in many spellings ("SATA_SSD", "nvme-pcie-v4", ...);
        // strip separators before matching.
        let tag: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match tag.as_str() {
            "hddv1" | "hdd1" => Ok(DiskGrade::Hdd1),
            "hddv2" | "hdd2" | "hdd" => Ok(DiskGrade::Hdd2),
            "hddv3" | "hdd3" | "sashdd" => Ok(DiskGrade::Hdd3),
            "satassdv1" | "satassd1" | "satassd" | "ssd" => Ok(DiskGrade::SataSsd1),
            "satassdv2" | "satassd2" => Ok(DiskGrade::SataSsd2),
            "sasssdv1" | "sasssd1" | "sasssd" => Ok(DiskGrade::SasSsd1),
            "sasssdv2" | "sasssd2" => Ok(DiskGrade::SasSsd2),
            "nvmepciev3" | "nvmepcie3" => Ok(DiskGrade::NvmePcie3),
            "nvmepciev4" | "nvmepcie4" | "nvme" => Ok(DiskGrade::NvmePcie4),
            "nvmepciev5" | "nvmepcie5" => Ok(DiskGrade::NvmePcie5),
            other => Err(format!("unknown disk class tag '{other}'")),
        }
    }
}

/// User-facing disk description: a ladder tag, a blend of tags for striped
/// or mixed volumes, or explicit numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiskSpec {
    Grade {
        tag: String,
    },
    Blend {
        tags: Vec<String>,
        /// Generalized-mean level; the negative default biases the blend
        /// toward the slowest member.
        #[serde(default = "default_blend_level")]
        p: f64,
    },
    Explicit {
        random_iops: u64,
        throughput_mib: u64,
    },
}

fn default_blend_level() -> f64 {
    -1.0
}

/// Resolved disk capability used by the tuning formulas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DiskPerf {
    pub random_iops: u64,
    pub throughput_mib: u64,
    /// Set when the spec came from an HDD-class tag; checkpoint completion
    /// target treats spinning media more gently.
    pub spinning: bool,
}

impl DiskPerf {
    pub fn from_grade(grade: DiskGrade) -> Self {
        DiskPerf {
            random_iops: grade.random_iops(),
            throughput_mib: grade.throughput_mib(),
            spinning: grade.is_spinning(),
        }
    }

    /// Construct from a user spec; unknown tags and zero capabilities fail.
    pub fn from_spec(spec: &DiskSpec) -> Result<Self, TuneError> {
        match spec {
            DiskSpec::Grade { tag } => {
                let grade: DiskGrade =
                    tag.parse().map_err(TuneError::InvalidDiskSpec)?;
                Ok(DiskPerf::from_grade(grade))
            }
            DiskSpec::Blend { tags, p } => {
                if tags.is_empty() {
                    return Err(TuneError::InvalidDiskSpec(
                        "a disk blend needs at least one tag".to_string(),
                    ));
                }
                if !p.is_finite() {
                    return Err(TuneError::InvalidDiskSpec(format!(
                        "blend level {p} is not a finite number"
                    )));
                }
                let grades = tags
                    .iter()
                    .map(|tag| tag.parse::<DiskGrade>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(TuneError::InvalidDiskSpec)?;
                let tputs: Vec<f64> =
                    grades.iter().map(|g| g.throughput_mib() as f64).collect();
                Ok(DiskPerf {
                    random_iops: mean_of_grades(&grades, *p),
                    throughput_mib: generalized_mean(&tputs, *p).floor() as u64,
                    // One spindle in the stripe gates the whole volume.
                    spinning: grades.iter().any(|g| g.is_spinning()),
                })
            }
            DiskSpec::Explicit {
                random_iops,
                throughput_mib,
            } => {
                if *random_iops == 0 || *throughput_mib == 0 {
                    return Err(TuneError::InvalidDiskSpec(
                        "random_iops and throughput_mib must be positive".to_string(),
                    ));
                }
                Ok(DiskPerf {
                    random_iops: *random_iops,
                    throughput_mib: *throughput_mib,
                    spinning: *random_iops < 1_000,
                })
            }
        }
    }

    /// The throughput equivalent of this disk's random IOPS, in MiB/s.
    pub fn random_throughput_mib(self) -> f64 {
        iops_to_throughput(self.random_iops)
    }
}

/// Convert 8 KiB-page IOPS to MiB/s.
pub fn iops_to_throughput(iops: u64) -> f64 {
    iops as f64 * DB_PAGE_SIZE as f64 / MI as f64
}

/// Convert MiB/s to 8 KiB-page IOPS.
pub fn throughput_to_iops(throughput_mib: f64) -> u64 {
    (throughput_mib * (MI / DB_PAGE_SIZE) as f64).floor() as u64
}

/// Blend several disk classes into one IOPS figure via the generalized mean.
/// Negative `p` biases toward the slowest member, which is the safe estimate
/// for striped or mixed volumes.
pub fn mean_of_grades(grades: &[DiskGrade], p: f64) -> u64 {
    let iops: Vec<f64> = grades.iter().map(|g| g.random_iops() as f64).collect();
    generalized_mean(&iops, p).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_is_strictly_monotonic() {
        for pair in DiskGrade::ALL.windows(2) {
            assert!(pair[0].random_iops() < pair[1].random_iops());
            assert!(pair[0].throughput_mib() < pair[1].throughput_mib());
        }
    }

    #[test]
    fn iops_throughput_round_trip() {
        assert_eq!(iops_to_throughput(128), 1.0);
        assert_eq!(throughput_to_iops(1.0), 128);
        let iops = DiskGrade::SataSsd1.random_iops();
        assert_eq!(throughput_to_iops(iops_to_throughput(iops)), iops);
    }

    #[test]
    fn tags_parse_with_loose_spelling() {
        assert_eq!("SATA_SSD".parse::<DiskGrade>().unwrap(), DiskGrade::SataSsd1);
        assert_eq!(
            "nvme-pcie-v4".parse::<DiskGrade>().unwrap(),
            DiskGrade::NvmePcie4
        );
        assert_eq!("hddv2".parse::<DiskGrade>().unwrap(), DiskGrade::Hdd2);
    }

    #[test]
    fn unknown_tag_is_invalid_disk_spec() {
        let spec = DiskSpec::Grade {
            tag: "UNOBTANIUM".to_string(),
        };
        assert!(matches!(
            DiskPerf::from_spec(&spec),
            Err(TuneError::InvalidDiskSpec(_))
        ));
    }

    #[test]
    fn explicit_spec_requires_positive_numbers() {
        let spec = DiskSpec::Explicit {
            random_iops: 0,
            throughput_mib: 100,
        };
        assert!(DiskPerf::from_spec(&spec).is_err());
    }

    #[test]
    fn mean_of_grades_biases_toward_slowest_for_negative_p() {
        let blend = mean_of_grades(&[DiskGrade::Hdd2, DiskGrade::NvmePcie4], -1.0);
        assert!(blend < 1_000, "negative p should stay near the HDD, got {blend}");
        let blend = mean_of_grades(&[DiskGrade::Hdd2, DiskGrade::NvmePcie4], 1.0);
        assert_eq!(blend, 250_100);
    }

    #[test]
    fn blend_spec_resolves_through_the_generalized_mean() {
        let spec = DiskSpec::Blend {
            tags: vec!["hddv2".to_string(), "nvmepciev4".to_string()],
            p: -1.0,
        };
        let perf = DiskPerf::from_spec(&spec).unwrap();
        assert_eq!(
            perf.random_iops,
            mean_of_grades(&[DiskGrade::Hdd2, DiskGrade::NvmePcie4], -1.0)
        );
        assert!(perf.throughput_mib < DiskGrade::NvmePcie4.throughput_mib());
        assert!(perf.spinning, "a spindle in the stripe gates the volume");

        let same = DiskSpec::Blend {
            tags: vec!["satassdv1".to_string()],
            p: 1.0,
        };
        assert_eq!(
            DiskPerf::from_spec(&same).unwrap().random_iops,
            DiskGrade::SataSsd1.random_iops()
        );
    }

    #[test]
    fn blend_spec_rejects_bad_input() {
        let empty = DiskSpec::Blend {
            tags: Vec::new(),
            p: -1.0,
        };
        assert!(matches!(
            DiskPerf::from_spec(&empty),
            Err(TuneError::InvalidDiskSpec(_))
        ));
        let unknown = DiskSpec::Blend {
            tags: vec!["hddv2".to_string(), "UNOBTANIUM".to_string()],
            p: -1.0,
        };
        assert!(DiskPerf::from_spec(&unknown).is_err());
        let bad_level = DiskSpec::Blend {
            tags: vec!["hddv2".to_string()],
            p: f64::NAN,
        };
        assert!(DiskPerf::from_spec(&bad_level).is_err());
    }
}
