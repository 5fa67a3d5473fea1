//! Base construction services
//!
//! Steps every strategy shares: execution-site routing, executable
//! resolution, profile layering, proxy staging, priority assignment and
//! permission fix-up injection.

use crate::config::TransferConfig;
use crate::context::PlannerContext;
use crate::error::TransferError;
use crate::graph::Refiner;
use crate::strategy::{Protocol, TransferRequest};
use tracing::{debug, error};
use xfer_catalog::{GatewayKind, SynthesisPolicy};
use xfer_model::{
    absolute_path, keys, AuxiliaryJob, AuxiliaryKind, ComputeJob, FileTransfer, JobClass,
    JobUnderConstruction, Namespace, Profiles, TransferJob, TransformationName, Universe,
    LOCAL_SITE,
};

/// Executable of no-op jobs
pub const NOOP_EXECUTABLE: &str = "/bin/true";

/// Name prefix of execute-bit jobs
pub const XBIT_PREFIX: &str = "chmod_";

/// Name prefix of no-op jobs
pub const NOOP_PREFIX: &str = "noop_";

/// Transformation that sets the execute bit
#[must_use]
pub fn xbit_transformation() -> TransformationName {
    TransformationName::namespaced("pegasus", "dirmanager")
}

/// Default execute-bit entry: `<PEGASUS_HOME>/bin/dirmanager`
pub static XBIT_SYNTHESIS: SynthesisPolicy = SynthesisPolicy {
    home_variable: "PEGASUS_HOME",
    required_variables: &["PEGASUS_HOME"],
    optional_variables: &[],
};

/// Transformation recorded on no-op jobs
#[must_use]
pub fn noop_transformation() -> TransformationName {
    TransformationName::namespaced("pegasus", "noop").with_version("1.0")
}

/// Site a transfer for `site` runs on.
///
/// Third-party transfers run on the submit host unless the driver asks for
/// them to run on the remote site. Everything else runs on `site`.
#[must_use]
pub fn execution_site(
    driver: &dyn Refiner,
    site: &str,
    class: JobClass,
    always_third_party: bool,
) -> String {
    if always_third_party || driver.is_site_third_party(site, class) {
        if driver.run_tpt_on_remote_site(site, class) {
            site.to_string()
        } else {
            LOCAL_SITE.to_string()
        }
    } else {
        site.to_string()
    }
}

/// Layer site, catalog-entry and global profiles onto `profiles`, in that
/// order, each overriding the previous.
pub fn layer_profiles(
    ctx: &PlannerContext,
    profiles: &mut Profiles,
    site: &str,
    entry_profiles: &Profiles,
) {
    if let Some(site_entry) = ctx.site(site) {
        profiles.merge(&site_entry.profiles);
    }
    profiles.merge(entry_profiles);
    profiles.merge(&ctx.config().profiles);
}

/// Priority configured for `class`
#[must_use]
pub fn priority(config: &TransferConfig, class: JobClass) -> Option<String> {
    config.priorities.get(class).map(|p| p.to_string())
}

/// Set the scheduler priority when one is configured for the job's class
pub fn apply_priority(ctx: &PlannerContext, job: &mut JobUnderConstruction) {
    if let Some(p) = priority(ctx.config(), job.class) {
        job.scheduling.priority = Some(p);
    }
}

fn is_pool_style(profiles: &Profiles) -> bool {
    profiles
        .get(Namespace::Pegasus, keys::STYLE)
        .is_some_and(|s| s.eq_ignore_ascii_case("condor") || s.eq_ignore_ascii_case("glidein"))
}

/// Whether the job must carry the user proxy with it
#[must_use]
pub fn needs_proxy_staging(job: &JobUnderConstruction) -> bool {
    let explicit = job.profiles.flag(Namespace::Pegasus, keys::TRANSFER_PROXY);
    let local_vanilla = job.site == LOCAL_SITE
        && matches!(job.scheduling.universe, Universe::Vanilla | Universe::Standard);
    explicit || is_pool_style(&job.profiles) || local_vanilla
}

/// Ship the local proxy with the job when it needs one.
///
/// The proxy becomes a side file and `X509_USER_PROXY` points at its
/// basename. A permission-repair pre-command is added only when neither the
/// explicit proxy flag nor a pool style triggered staging. Returns whether
/// the job was modified.
pub fn apply_proxy_staging(ctx: &PlannerContext, job: &mut JobUnderConstruction) -> bool {
    if !needs_proxy_staging(job) {
        return false;
    }
    let Some(proxy) = ctx.proxy() else {
        debug!(job = %job.name, "proxy staging needed but no local proxy is configured");
        return false;
    };

    let explicit = job.profiles.flag(Namespace::Pegasus, keys::TRANSFER_PROXY);
    let pool = is_pool_style(&job.profiles);
    let basename = proxy.file_name().map_or_else(
        || proxy.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    );

    job.scheduling
        .transfer_input_files
        .insert(proxy.display().to_string());
    job.profiles
        .set(Namespace::Env, keys::X509_USER_PROXY, basename.as_str());
    if !explicit && !pool {
        job.profiles.set(
            Namespace::Env,
            keys::GRIDSTART_PREJOB,
            format!("/bin/chmod 600 {basename}"),
        );
    }
    if !explicit {
        job.profiles.set(Namespace::Pegasus, keys::TRANSFER_PROXY, "true");
    }
    job.profiles.remove(Namespace::Condor, keys::REMOTE_INITIALDIR);
    job.scheduling.keep_initial_dir = true;
    debug!(job = %job.name, proxy = %proxy.display(), "staging proxy with job");
    true
}

/// Start a transfer job: route it, resolve its executable, layer profiles,
/// then apply proxy staging and priority.
///
/// # Errors
/// Returns [`TransferError::CatalogLookup`] if the protocol has no
/// executable on the execution site
pub fn prepare_job(
    ctx: &PlannerContext,
    driver: &dyn Refiner,
    protocol: &dyn Protocol,
    request: &TransferRequest<'_>,
) -> Result<JobUnderConstruction, TransferError> {
    let compute = request.compute_job;
    let site = execution_site(
        driver,
        &compute.site,
        request.class,
        protocol.always_third_party(),
    );

    let Some(entry) = protocol.resolve_executable(ctx, &site) else {
        let transformation = protocol.transformation();
        error!(
            job = request.job_name,
            site = %site,
            transformation = %transformation,
            "no transfer executable"
        );
        return Err(TransferError::catalog_lookup(
            transformation,
            site,
            request.job_name,
            request.first_lfn(),
        ));
    };

    let mut job =
        JobUnderConstruction::new(request.job_name, request.class, &compute.name, &compute.site);
    job.site = site;
    job.transformation = entry.name.clone();
    job.executable = entry.physical_path.clone();
    job.files = request.files.to_vec();
    job.scheduling.grid_endpoint = ctx
        .site(&job.site)
        .and_then(|s| s.gateway(GatewayKind::Transfer).map(|g| g.contact.clone()));

    layer_profiles(ctx, &mut job.profiles, &job.site, &entry.profiles);
    if let Some(universe) = job
        .profiles
        .get(Namespace::Condor, keys::UNIVERSE)
        .and_then(|u| u.parse::<Universe>().ok())
    {
        job.scheduling.universe = universe;
    }

    apply_proxy_staging(ctx, &mut job);
    apply_priority(ctx, &mut job);
    Ok(job)
}

/// Run fix-up injection when the protocol needs it, then seal the job
///
/// # Errors
/// Returns any error from [`inject_permission_fixups`]
pub fn finish_job(
    ctx: &PlannerContext,
    driver: &mut dyn Refiner,
    protocol: &dyn Protocol,
    request: &TransferRequest<'_>,
    job: JobUnderConstruction,
) -> Result<TransferJob, TransferError> {
    if !request.exec_files.is_empty() && !protocol.preserves_execute_bit() {
        inject_permission_fixups(
            ctx,
            driver,
            request.compute_job,
            &job.name,
            job.class,
            request.exec_files,
        )?;
    }
    Ok(job.finalize())
}

/// Add one execute-bit (or no-op) job per staged executable, wired
/// `transfer -> fixup -> compute`. Returns whether any job was created.
///
/// # Errors
/// Returns [`TransferError::UnsupportedJobClass`] unless `transfer_class`
/// is stage-in, [`TransferError::CatalogLookup`] if the execute-bit
/// transformation is missing, or a graph error from the driver
pub fn inject_permission_fixups(
    ctx: &PlannerContext,
    driver: &mut dyn Refiner,
    compute_job: &ComputeJob,
    transfer_job: &str,
    transfer_class: JobClass,
    exec_files: &[FileTransfer],
) -> Result<bool, TransferError> {
    if transfer_class != JobClass::StageIn {
        error!(job = transfer_job, class = %transfer_class, "fix-ups requested for non stage-in job");
        return Err(TransferError::UnsupportedJobClass {
            strategy: "permission fix-up",
            class: transfer_class,
            job: transfer_job.to_string(),
        });
    }

    let noop = ctx.disabled_chmod().contains(&compute_job.site);
    for (counter, file) in exec_files.iter().enumerate() {
        let fixup = if noop {
            noop_job(compute_job, counter)
        } else {
            xbit_job(ctx, compute_job, file, counter)?
        };
        let name = fixup.name.clone();
        let site = fixup.site.clone();
        debug!(job = %name, kind = ?fixup.kind, lfn = file.lfn(), "adding fix-up job");

        driver
            .add_job(fixup.into())
            .map_err(|e| TransferError::graph(&name, e))?;
        driver
            .add_relation(transfer_job, &name, &site, true)
            .map_err(|e| TransferError::graph(&name, e))?;
        driver
            .add_relation(&name, &compute_job.name, &compute_job.site, false)
            .map_err(|e| TransferError::graph(&name, e))?;
    }
    Ok(!exec_files.is_empty())
}

fn noop_job(compute_job: &ComputeJob, counter: usize) -> AuxiliaryJob {
    let profiles = Profiles::new()
        .with(Namespace::Condor, keys::NOOP_JOB, "true")
        .with(Namespace::Condor, keys::NOOP_JOB_EXIT_CODE, "0")
        .with(Namespace::Pegasus, keys::GRIDSTART, "none");
    AuxiliaryJob {
        name: format!("{NOOP_PREFIX}{}_{counter}", compute_job.name),
        kind: AuxiliaryKind::NoOp,
        compute_job: compute_job.name.clone(),
        site: LOCAL_SITE.to_string(),
        transformation: Some(noop_transformation()),
        executable: NOOP_EXECUTABLE.to_string(),
        arguments: String::new(),
        universe: Universe::Vanilla,
        profiles,
    }
}

fn xbit_job(
    ctx: &PlannerContext,
    compute_job: &ComputeJob,
    file: &FileTransfer,
    counter: usize,
) -> Result<AuxiliaryJob, TransferError> {
    let name = format!("{XBIT_PREFIX}{}_{counter}", compute_job.name);
    let destination = file.destination();
    let transformation = xbit_transformation();

    let Some(resolution) =
        ctx.resolver()
            .resolve_or_synthesize(&transformation, &destination.site, Some(&XBIT_SYNTHESIS))
    else {
        error!(
            job = %name,
            site = %destination.site,
            transformation = %transformation,
            "no execute-bit executable"
        );
        return Err(TransferError::catalog_lookup(
            transformation,
            &destination.site,
            name,
            Some(file.lfn()),
        ));
    };

    let entry = resolution.entry;
    let mut profiles = Profiles::new();
    layer_profiles(ctx, &mut profiles, &destination.site, &entry.profiles);
    Ok(AuxiliaryJob {
        name,
        kind: AuxiliaryKind::SetXBit,
        compute_job: compute_job.name.clone(),
        site: destination.site.clone(),
        transformation: Some(transformation),
        executable: entry.physical_path,
        arguments: format!("-X -f {}", absolute_path(&destination.url)),
        universe: Universe::Vanilla,
        profiles,
    })
}
