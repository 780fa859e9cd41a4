use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use gpx::{Gpx, GpxVersion, Track, TrackSegment};
use tracing::{info, warn};

use crate::error::{Result, TrackerError};
use crate::tracking::models::{ActivitySession, PositionFix};

/// Accuracy assumed for GPX points that carry no dilution of precision.
const DEFAULT_GPX_ACCURACY_M: f64 = 5.0;
/// Rough user equivalent range error, meters per unit of HDOP.
const UERE_M: f64 = 5.0;

/// Read every timed track point of a GPX file as a position fix.
pub async fn read_gpx_fixes(file_name: &str) -> Result<Vec<PositionFix>> {
    let path = Path::new(file_name);
    if !path.exists() {
        return Err(TrackerError::NotFound(format!(
            "File does not exist: {}",
            file_name
        )));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_gpx_fixes(&content)
}

pub fn parse_gpx_fixes(content: &str) -> Result<Vec<PositionFix>> {
    let gpx = gpx::read(Cursor::new(content))
        .map_err(|e| TrackerError::gpx(format!("Error reading GPX file: {}", e)))?;

    let mut fixes = Vec::new();
    let mut skipped = 0;

    for track in gpx.tracks {
        for segment in track.segments {
            for point in segment.points {
                let Some(timestamp) = point.time.and_then(gpx_time_to_utc) else {
                    skipped += 1;
                    continue;
                };

                let geo = point.point();
                fixes.push(PositionFix {
                    latitude: geo.y(),
                    longitude: geo.x(),
                    accuracy: point
                        .hdop
                        .map_or(DEFAULT_GPX_ACCURACY_M, |hdop| hdop * UERE_M),
                    altitude: point.elevation,
                    heading: None,
                    speed: None,
                    timestamp,
                });
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} GPX points without a timestamp", skipped);
    }
    fixes.sort_by_key(|fix| fix.timestamp);

    Ok(fixes)
}

fn gpx_time_to_utc(time: gpx::Time) -> Option<DateTime<Utc>> {
    let iso = time.format().ok()?;
    DateTime::parse_from_rfc3339(&iso)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Write the session route as a GPX track, lifecycle markers as GPX waypoints.
pub fn write_gpx<W: Write>(session: &ActivitySession, writer: W) -> Result<()> {
    let mut segment = TrackSegment::new();
    segment.points = session
        .route
        .iter()
        .map(|point| {
            gpx::Waypoint::new(geo_types::Point::new(point.longitude, point.latitude))
        })
        .collect();

    let mut track = Track::new();
    track.name = Some(format!("{} {}", session.kind, session.id));
    track.type_ = Some(session.kind.to_string());
    track.segments.push(segment);

    let markers = session
        .waypoints
        .iter()
        .map(|marker| {
            let mut waypoint = gpx::Waypoint::new(geo_types::Point::new(
                marker.position.longitude,
                marker.position.latitude,
            ));
            waypoint.name = Some(format!("{:?}", marker.kind).to_lowercase());
            waypoint.description = Some(marker.timestamp.to_rfc3339());
            waypoint.comment = marker.note.clone();
            waypoint
        })
        .collect();

    let document = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("activity_tracker".to_string()),
        waypoints: markers,
        tracks: vec![track],
        ..Default::default()
    };

    gpx::write(&document, writer)
        .map_err(|e| TrackerError::gpx(format!("Error writing GPX file: {}", e)))
}

pub fn export_gpx_file(session: &ActivitySession, file_name: &str) -> Result<()> {
    let file = File::create(file_name)?;
    write_gpx(session, BufWriter::new(file))?;
    info!("Exported session {} to {}", session.id, file_name);
    Ok(())
}
